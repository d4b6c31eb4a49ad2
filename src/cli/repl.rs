use anyhow::Result;
use std::io::{self, Write};

use crate::core::message::{ChatMessage, ChatSession, Sender};

pub async fn run(app: super::App) -> Result<()> {
    println!("\x1b[1mdkchat\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
    println!("Digite \x1b[33m/help\x1b[0m para comandos, \x1b[33mCtrl-D\x1b[0m para sair.\n");

    let mut session = app.resume_or_create().await?;
    let prior = app.db.messages().list(session.id).await?;
    if !prior.is_empty() {
        println!(
            "Retomando a sessão {} ({} mensagens).\n",
            session.id,
            prior.len()
        );
        for msg in &prior {
            print_message(msg);
        }
        println!();
    }

    loop {
        eprint!("\x1b[32;1mvocê>\x1b[0m ");
        io::stderr().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                // EOF (Ctrl-D)
                println!("\nAté logo!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Erro de entrada: {e}");
                break;
            }
        }

        let input = input.trim().to_string();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            match handle_command(&input, &app, &mut session).await {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    eprintln!("\x1b[31mErro no comando: {e}\x1b[0m");
                    continue;
                }
            }
        }

        // One blocking pipeline per input line; no overlapping requests.
        let reply = app.exchange(session.id, &input).await?;
        println!("\x1b[36mdk>\x1b[0m {reply}");
    }

    Ok(())
}

async fn handle_command(
    input: &str,
    app: &super::App,
    session: &mut ChatSession,
) -> Result<bool> {
    match input {
        "/help" | "/h" => {
            println!("\x1b[1mComandos:\x1b[0m");
            println!("  /help      Mostra esta ajuda");
            println!("  /history   Reexibe as mensagens da sessão");
            println!("  /clear     Apaga as mensagens da sessão atual");
            println!("  /new       Inicia uma nova sessão");
            println!("  /purge     Exclui a sessão atual e inicia outra");
            println!("  /exit      Sai");
            Ok(true)
        }
        "/exit" | "/quit" | "/q" => {
            println!("Até logo!");
            Ok(false)
        }
        "/history" => {
            let messages = app.db.messages().list(session.id).await?;
            if messages.is_empty() {
                println!("Sessão {} sem mensagens.", session.id);
            } else {
                for msg in &messages {
                    print_message(msg);
                }
            }
            Ok(true)
        }
        "/clear" => {
            app.db.messages().clear(session.id).await?;
            println!("Histórico da sessão {} apagado.", session.id);
            Ok(true)
        }
        "/new" => {
            *session = app.db.sessions().create().await?;
            println!("Nova sessão {} iniciada.", session.id);
            Ok(true)
        }
        "/purge" => {
            let old = session.id;
            app.db.sessions().delete(old).await?;
            *session = app.db.sessions().create().await?;
            println!("Sessão {} excluída; nova sessão {}.", old, session.id);
            Ok(true)
        }
        _ => {
            println!("Comando desconhecido: {input}. Use /help.");
            Ok(true)
        }
    }
}

fn print_message(msg: &ChatMessage) {
    match msg.sender {
        Sender::User => println!("\x1b[32mvocê>\x1b[0m {}", msg.text),
        Sender::Assistant => println!("\x1b[36mdk>\x1b[0m {}", msg.text),
    }
}
