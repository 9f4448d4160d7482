use anyhow::Result;
use ccf_cli::{
    build_orchestrator, finish, init_tracing, load_config, parse_args, print_json, DeleteArgs,
};
use std::process::ExitCode;

async fn run(args: DeleteArgs) -> Result<u8> {
    let config = load_config(args.connection.use_http)?;
    let credentials = args.connection.credentials()?;
    let location = args.connection.location(&config)?;
    tracing::debug!(
        credentials = %credentials,
        resource = %location.describe(),
        force = args.force,
        "Parsed parameters"
    );

    let orchestrator = build_orchestrator(&config, credentials)?;
    let outcome = orchestrator.remove_resource(&location, args.force).await?;
    print_json(&serde_json::json!({
        "resource": location.describe(),
        "outcome": outcome,
    }))?;
    Ok(0)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args::<DeleteArgs, _, _>(std::env::args_os()) {
        Ok(args) => args,
        Err(usage) => return usage.emit(),
    };
    finish(run(args).await)
}
