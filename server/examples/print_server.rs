//! An smtp server that prints every request and content block it receives.

use std::env;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio_util::compat::TokioAsyncReadCompatExt;

use smtp_codec_common::{
    commands::{Command, Request},
    content::ContentBlock,
    reply::Response,
};
use smtp_codec_server::{Handler, Server};

struct PrintHandler;

#[async_trait]
impl Handler for PrintHandler {
    type Error = &'static str;

    async fn request(&mut self, request: Request) -> Result<Response, Self::Error> {
        println!("\n======== {} ========", request.command());
        for parameter in request.parameters() {
            println!("  parameter: {parameter}");
        }

        let response = match request.command() {
            Command::Ehlo => Response::new(250, ["localhost", "8BITMIME", "HELP"]),
            Command::Data => Response::single(354, "End data with <CR><LF>.<CR><LF>"),
            Command::Quit => Response::single(221, "Bye"),
            Command::Help => Response::new(214, ["Commands:", "EHLO HELO MAIL RCPT DATA", "RSET NOOP QUIT"]),
            Command::Vrfy | Command::Expn => Response::single(252, "Cannot verify"),
            Command::Unknown(_) => Response::single(500, "Command unrecognized"),
            _ => Response::single(250, "Ok"),
        };
        Ok(response)
    }

    async fn content(&mut self, content: ContentBlock) -> Result<Response, Self::Error> {
        println!("\n======== CONTENT ========");
        println!("  lines: {}", content.line_count());
        println!("{}", String::from_utf8_lossy(content.as_bytes()));
        Ok(Response::single(250, "Queued"))
    }
}

#[tokio::main]
async fn main() {
    let addr = env::var("LISTEN_ADDR").unwrap_or("127.0.0.1:2525".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to addr");
    println!("\n======== Bound to socket ========");

    let mut handler = PrintHandler;
    let mut server = Server::default_rfc5321(&mut handler);

    loop {
        println!();
        println!("=========================================");
        println!("======== Awaiting new connection ========");
        let (stream, _socket_addr) = listener
            .accept()
            .await
            .expect("Failed accepting connection");
        if let Err(err) = server.handle_connection(stream.compat()).await {
            println!("Connection ended with an error: {err}");
        }
    }
}
