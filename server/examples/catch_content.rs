//! An smtp server storing every received content block as a file.

use std::{env, path::PathBuf};

use async_trait::async_trait;
use miette::{Context, IntoDiagnostic, Result};
use tokio::{fs, net::TcpListener};
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing_subscriber::EnvFilter;

use smtp_codec_common::{
    commands::{Command, Request},
    content::ContentBlock,
    reply::Response,
};
use smtp_codec_server::{Handler, Server};

struct CatchContent {
    dir: PathBuf,
    received: usize,
}

#[async_trait]
impl Handler for CatchContent {
    type Error = std::io::Error;

    async fn request(&mut self, request: Request) -> Result<Response, Self::Error> {
        Ok(match request.command() {
            Command::Data => Response::single(354, "Go ahead"),
            Command::Quit => Response::single(221, "Bye"),
            _ => Response::single(250, "Ok"),
        })
    }

    async fn content(&mut self, content: ContentBlock) -> Result<Response, Self::Error> {
        self.received += 1;
        let path = self.dir.join(format!("{}.eml", self.received));
        fs::write(&path, content.as_bytes()).await?;

        Ok(Response::single(250, format!("Stored as {}", path.display())))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr = env::var("LISTEN_ADDR").unwrap_or("127.0.0.1:2525".to_string());
    let dir = PathBuf::from(env::var("OUTPUT_DIR").unwrap_or("./mails".to_string()));
    fs::create_dir_all(&dir)
        .await
        .into_diagnostic()
        .wrap_err("Failed creating output dir")?;

    let listener = TcpListener::bind(&addr)
        .await
        .into_diagnostic()
        .wrap_err("Failed to bind to addr")?;

    let mut handler = CatchContent { dir, received: 0 };
    let mut server = Server::default_rfc5321(&mut handler);

    loop {
        let (stream, _socket_addr) = listener
            .accept()
            .await
            .into_diagnostic()
            .wrap_err("Failed accepting connection")?;
        server
            .handle_connection(stream.compat())
            .await
            .into_diagnostic()
            .wrap_err("Failed handling this connection")?;
    }
}
