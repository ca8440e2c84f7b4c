//! Interactive command handler.
//!
//! Reads questions from stdin, one per line, until EOF or `exit`. A failed
//! search is reported on stderr and the loop continues.

use crate::shell;
use clap::Args;
use std::io::Write;
use textfusion_core::{config::AppConfig, AppResult};
use textfusion_search::SearchEngine;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Answer questions read line by line from stdin
#[derive(Args, Debug)]
pub struct InteractiveCommand {
    /// Do not print the results header above each answer
    #[arg(long)]
    pub no_header: bool,
}

impl InteractiveCommand {
    /// Execute the interactive command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing interactive command");

        let engine = SearchEngine::from_config(config)?;
        eprintln!("Ask a question (empty line skips, 'exit' quits).");

        let input = BufReader::new(tokio::io::stdin());
        let answered = self
            .run(&engine, input, &mut std::io::stdout(), &mut std::io::stderr())
            .await?;

        tracing::info!("Answered {} questions", answered);
        Ok(())
    }

    /// Drive the read-search-print loop. Returns the number of answers printed.
    pub async fn run<R, W, E>(
        &self,
        engine: &SearchEngine,
        input: R,
        out: &mut W,
        err: &mut E,
    ) -> AppResult<usize>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        E: Write,
    {
        let mut lines = input.lines();
        let mut answered = 0;

        loop {
            write!(err, "> ")?;
            err.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let query = line.trim();

            if matches!(query, "exit" | "quit") {
                break;
            }

            if shell::should_dispatch(query) {
                writeln!(err, "Searching...")?;
            }

            match shell::handle_query(engine, query).await {
                None => continue,
                Some(Ok(answer)) => {
                    if !self.no_header {
                        writeln!(out, "{}\n", shell::results_header(query))?;
                    }
                    writeln!(out, "{}\n", answer)?;
                    answered += 1;
                }
                Some(Err(e)) => {
                    writeln!(err, "Error: {}", e.detail())?;
                }
            }
        }

        Ok(answered)
    }
}
