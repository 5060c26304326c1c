//! A simple example smtp client sending a single mail

use std::env;

use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncReadCompatExt;

use miette::{IntoDiagnostic, Result};

use smtp_codec_client::Client;
use smtp_codec_common::content::ContentBlock;

#[tokio::main]
async fn main() -> Result<()> {
    let addr = env::var("SMTP_ADDR").unwrap_or("127.0.0.1:2525".to_string());
    let stream = TcpStream::connect(&addr)
        .await
        .expect("Failed connecting to smtp server")
        .compat();

    println!("Opened TCP connection");
    let client = Client::default();
    let mut connection = client
        .connect_via(stream)
        .await
        .expect("Failed to setup connection");
    println!("Greeted with: {}", connection.greeting());

    let ehlo = connection.ehlo("localhost").await.into_diagnostic()?;
    for extension in ehlo.details() {
        println!("Server offers: {extension}");
    }
    connection
        .mail(Some("sender@test.local"))
        .await
        .into_diagnostic()?;
    connection.rcpt("rcpt@test.local").await.into_diagnostic()?;
    connection.data().await.into_diagnostic()?;

    let queued = connection
        .content(ContentBlock::from(
            &b"Subject: Test\r\nX-Header: My value\r\n\r\nA very simple mail body\r\n"[..],
        ))
        .await
        .into_diagnostic()?;
    println!("Content accepted: {queued}");

    connection.quit().await.into_diagnostic()?;

    Ok(())
}
