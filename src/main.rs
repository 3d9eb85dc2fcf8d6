// src/main.rs

use tfdriver::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("tfdriver error: {err}");
        if let Some(output) = err
            .downcast_ref::<tfdriver::errors::DriverError>()
            .and_then(|e| e.captured_output())
        {
            eprintln!("--- terraform output ---\n{output}");
        }
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let output = run(args).await?;
    println!("{output}");
    Ok(())
}
