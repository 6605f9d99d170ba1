use clap::{error::ErrorKind, CommandFactory, Parser};
use tracing::info;

use check_prometheus::{load_config, report, run_check, CheckResult, CliArgs, PrometheusClient, Status};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    // GENERATE_ICINGA_COMMAND=1 prints a CheckCommand object for this binary
    if let Err(e) = nagiosplugin::config_generator::print_icinga_command_config_if_env_and_exit(
        "check-prometheus",
        &CliArgs::command(),
    ) {
        usage_error_and_exit(e);
    }

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{}", e);
            std::process::exit(Status::Ok.exit_code());
        }
        Err(e) => usage_error_and_exit(e),
    };

    // Fail before any network activity on bad configuration
    let cfg = match load_config(args) {
        Ok(cfg) => cfg,
        Err(e) => usage_error_and_exit(e),
    };
    info!("host = {}, query = {:?}, timeout = {:?}", cfg.host, cfg.query, cfg.timeout);

    let result = match PrometheusClient::new(&cfg.host, cfg.timeout) {
        Ok(client) => run_check(&cfg, &client).await,
        Err(e) => CheckResult::unknown(&cfg.name, format!("error creating client: {}", e)),
    };

    report(&result).print_and_exit();
}

fn usage_error_and_exit(err: impl std::fmt::Display) -> ! {
    println!("execution failed: {:#}", err);
    println!("{}", CliArgs::command().render_help());
    std::process::exit(Status::Unknown.exit_code());
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
