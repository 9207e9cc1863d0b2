use httptool::{
    default_logger, with_header, with_logger, with_slow_threshold, with_timeout, CancellationToken,
    Client, LogLevel, Logger,
};
use serde_json::json;
use std::error::Error;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "httptool=debug".into()))
        .init();

    // The default logger only emits warnings; lower it to see every request.
    let verbose = default_logger().log_mode(LogLevel::Debug);

    println!("=== Basic GET Request ===");

    let scope = CancellationToken::new();
    let reply = httptool::get(
        scope.clone(),
        "https://httpbin.org/get",
        [with_logger(verbose.clone())],
    )
    .await?;
    println!("Status: {}", reply.status());
    let preview: String = reply.text().chars().take(200).collect();
    println!("First 200 chars: {}", preview);

    println!("\n=== POST Request with JSON ===");

    let payload = json!({
        "name": "httptool",
        "version": "0.1.0",
        "language": "rust"
    });
    let reply = httptool::post_json(
        scope.clone(),
        "https://httpbin.org/post",
        &payload,
        [with_header("X-Demo", "basic_usage"), with_logger(verbose.clone())],
    )
    .await?;
    println!("Status: {}", reply.status());

    println!("\n=== Slow Request Warning ===");

    let reply = httptool::get(
        scope.clone(),
        "https://httpbin.org/delay/1",
        [with_slow_threshold(Duration::from_millis(500))],
    )
    .await?;
    println!("Status: {} (a slow-request warning was logged)", reply.status());

    println!("\n=== Error Handling Example ===");

    match httptool::get(scope.clone(), "https://httpbin.org/status/404", []).await {
        Ok(reply) => println!("Unexpected success: {}", reply.status()),
        Err(e) => println!("Expected error for 404: {} (status {:?})", e, e.status()),
    }

    match httptool::get(
        scope.clone(),
        "https://httpbin.org/delay/3",
        [with_timeout(Duration::from_millis(200))],
    )
    .await
    {
        Ok(reply) => println!("Unexpected success: {}", reply.status()),
        Err(e) => println!("Expected timeout: {}", e),
    }

    println!("\n=== Custom Shared Client ===");

    let custom = Client::builder().user_agent("httptool-demo/0.1")?.build()?;
    httptool::set_http_client(custom);
    let reply = httptool::get(scope, "https://httpbin.org/user-agent", []).await?;
    println!("Response: {}", reply.text());

    println!("\n=== All examples completed successfully! ===");

    Ok(())
}
