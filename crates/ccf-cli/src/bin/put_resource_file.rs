use anyhow::Result;
use ccf_cli::{
    build_orchestrator, finish, init_tracing, load_config, parse_args, print_json,
    put_outcome_exit_code, PutArgs,
};
use std::process::ExitCode;

async fn run(args: PutArgs) -> Result<u8> {
    let config = load_config(args.connection.use_http)?;
    // Everything is validated before the first request goes out.
    let credentials = args.connection.credentials()?;
    let request = args.to_request(&config)?;
    tracing::debug!(credentials = %credentials, request = ?request, "Parsed parameters");

    let orchestrator = build_orchestrator(&config, credentials)?;
    let outcome = orchestrator.put(&request).await?;
    print_json(&outcome)?;
    Ok(put_outcome_exit_code(&outcome))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args::<PutArgs, _, _>(std::env::args_os()) {
        Ok(args) => args,
        Err(usage) => return usage.emit(),
    };
    finish(run(args).await)
}
