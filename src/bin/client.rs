//! TCP Chat Relay - Terminal Client
//!
//! Connects to a relay server, prompts for a username, sends the join
//! announcement, then runs two concurrent units: one draining inbound
//! broadcast frames to the terminal, one reading stdin lines and sending
//! them as formatted chat lines. Typing `bye` leaves the chat.

use std::env;
use std::io::Write;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use tcpchat::command::LEAVE_KEYWORD;
use tcpchat::{message, resolve_port, FrameCodec, PortFallback, DEFAULT_PORT};

/// Default server address when none is provided
const DEFAULT_ADDR: &str = "127.0.0.1";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (addr, port) = resolve_target(env::args().skip(1).collect());

    println!("---------------------------");
    println!("Connecting to {} on port {}...", addr, port);

    let stream = match TcpStream::connect((addr.as_str(), port)).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("ERROR... Must have server running first before connecting client");
            return Err(e.into());
        }
    };
    println!("Connected to port {}!", port);

    let framed = Framed::new(stream, FrameCodec);
    let (mut sink, mut frames) = framed.split();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    let Some(username) = prompt_username(&mut stdin).await? else {
        return Ok(());
    };

    // announce first so the server can register this session
    sink.send(message::join_announcement(&username)).await?;

    // one unit drains inbound broadcasts; empty terminator frames are skipped
    let mut reader = tokio::spawn(async move {
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(line) if !line.is_empty() => println!("{}", line),
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });

    // the other unit drives interactive input and outbound sends
    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                sink.send(message::chat_line(&username, &line)).await?;
                if line.trim().eq_ignore_ascii_case(LEAVE_KEYWORD) {
                    println!("{}", message::farewell(&username));
                    break;
                }
            }
            _ = &mut reader => {
                println!("Disconnected from server.");
                return Ok(());
            }
        }
    }

    let _ = sink.close().await;
    reader.abort();
    Ok(())
}

/// Resolve server address and port from argv with documented defaults
///
/// One numeric argument is a port for the default address; one non-numeric
/// argument is an address with the default port; two arguments are address
/// then port. Anything missing or invalid falls back with a diagnostic.
fn resolve_target(args: Vec<String>) -> (String, u16) {
    match args.as_slice() {
        [] => {
            eprintln!(
                "No server address or port provided; using {}:{}",
                DEFAULT_ADDR, DEFAULT_PORT
            );
            (DEFAULT_ADDR.to_string(), DEFAULT_PORT)
        }
        [single] => match single.parse::<u16>() {
            Ok(port) => {
                eprintln!("No server address provided; using {}", DEFAULT_ADDR);
                (DEFAULT_ADDR.to_string(), port)
            }
            Err(_) => {
                eprintln!("No port provided; using {}", DEFAULT_PORT);
                (single.clone(), DEFAULT_PORT)
            }
        },
        [addr, raw_port, ..] => {
            let (port, fallback) = resolve_port(Some(raw_port));
            match fallback {
                Some(PortFallback::NonNumeric(raw)) | Some(PortFallback::OutOfRange(raw)) => {
                    eprintln!("Invalid port \"{}\"; using {}", raw, port);
                }
                _ => {}
            }
            (addr.clone(), port)
        }
    }
}

/// Prompt until the user enters a non-empty username
///
/// Returns `None` when stdin closes before a name is entered.
async fn prompt_username(
    stdin: &mut Lines<BufReader<Stdin>>,
) -> Result<Option<String>, std::io::Error> {
    print!("Enter username to continue: ");
    std::io::stdout().flush()?;

    loop {
        let Some(line) = stdin.next_line().await? else {
            eprintln!("User did not enter valid username.");
            return Ok(None);
        };

        let name = line.trim();
        if !name.is_empty() {
            return Ok(Some(name.to_string()));
        }

        print!("Not permitted until you enter a valid username. Enter a username to continue: ");
        std::io::stdout().flush()?;
    }
}
