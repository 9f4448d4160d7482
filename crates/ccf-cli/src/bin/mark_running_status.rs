use anyhow::Result;
use ccf_cli::{
    build_orchestrator, finish, init_tracing, load_config, parse_args, print_json, MarkArgs,
};
use ccf_services::{MarkerTransition, RunningStatusMarker};
use std::process::ExitCode;
use std::sync::Arc;

async fn run(args: MarkArgs) -> Result<u8> {
    let config = load_config(args.connection.use_http)?;
    let credentials = args.connection.credentials()?;
    let record = args.to_record(&config)?;
    let location = args.connection.location(&config)?;
    tracing::debug!(credentials = %credentials, record = ?record, "Parsed parameters");

    let orchestrator = Arc::new(build_orchestrator(&config, credentials)?);
    let marker = RunningStatusMarker::new(orchestrator, &config, location.server, location.project);

    let transition = marker.apply(&record).await?;
    print_json(&transition)?;
    Ok(match &transition {
        MarkerTransition::Marked(outcome) if !outcome.is_success() => 2,
        _ => 0,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args::<MarkArgs, _, _>(std::env::args_os()) {
        Ok(args) => args,
        Err(usage) => return usage.emit(),
    };
    finish(run(args).await)
}
