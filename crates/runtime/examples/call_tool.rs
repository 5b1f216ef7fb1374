//! Start a tool host, list its tools and optionally call one directly.
//!
//! Run with: cargo run --example call_tool -- <script.py|script.js> [tool] [json-args]

use runtime::{SessionLifecycle, SessionOptions, ToolArguments, ToolHost, render_output};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let script = args
        .next()
        .ok_or("usage: call_tool <script.py|script.js> [tool] [json-args]")?;

    println!("Starting tool host: {script}");
    let session = SessionLifecycle::start(&script, SessionOptions::default()).await?;

    println!("\nDiscovered {} tools:", session.tools().len());
    for tool in session.tools() {
        println!("  - {}", tool.name);
        if !tool.description.is_empty() {
            println!("    {}", tool.description);
        }
    }

    if let Some(name) = args.next() {
        let raw = args.next().unwrap_or_else(|| "{}".to_string());
        let arguments = ToolArguments::parse(&raw)?;

        println!("\nCalling {name} with {arguments}...");
        match session.host().call_tool(&name, arguments).await {
            Ok(output) => println!("Tool returned:\n  {}", render_output(&output)),
            Err(e) => println!("Error: {e}"),
        }
    }

    session.stop();
    println!("\nDone!");
    Ok(())
}
