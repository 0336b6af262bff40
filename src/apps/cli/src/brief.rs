//! Interactive morning briefing in the terminal

use crate::api::ApiClient;
use anyhow::Result;
use onething_core::briefing::{
    strip_selection, BriefingEvent, HttpBriefingTransport, APOLOGY_MESSAGE, SELECTION_OPEN,
};
use onething_core::BriefingDriver;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

/// Prints the visible part of the streaming assistant message as it grows.
pub struct TurnPrinter<W: Write> {
    out: W,
    printed: String,
    opening: bool,
}

impl<W: Write> TurnPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: String::new(),
            opening: true,
        }
    }

    /// Mark the opening turn as over. A failed opening turn replaces the
    /// transcript with an apology, which is shown in place of the reply.
    pub fn opening_done(&mut self) {
        self.opening = false;
    }

    /// Write only what became visible since the last update. Marker text is
    /// never shown, even while its block is still being streamed.
    pub fn show(&mut self, raw: &str) -> std::io::Result<()> {
        let stripped = strip_selection(raw);
        let visible = hold_back_partial_marker(&stripped);
        if let Some(delta) = visible.strip_prefix(self.printed.as_str()) {
            if !delta.is_empty() {
                self.out.write_all(delta.as_bytes())?;
                self.out.flush()?;
                self.printed = visible.to_string();
            }
        }
        Ok(())
    }

    pub fn handle(&mut self, event: BriefingEvent) -> std::io::Result<()> {
        match event {
            BriefingEvent::Loading { .. } => {}
            BriefingEvent::AssistantUpdated { content } => self.show(&content)?,
            BriefingEvent::Completed { task, goal } => {
                self.end_line()?;
                writeln!(self.out, "\nToday's ONE Thing: {}", task.title)?;
                writeln!(self.out, "Goal: {}", goal)?;
            }
            BriefingEvent::SelectionUnresolved { task_title } => {
                self.end_line()?;
                writeln!(
                    self.out,
                    "(\"{}\" does not match any task, keep going)",
                    task_title
                )?;
            }
            BriefingEvent::Failed { message } => {
                self.end_line()?;
                if self.opening {
                    writeln!(self.out, "{}", APOLOGY_MESSAGE)?;
                }
                eprintln!("Briefing request failed: {}", message);
            }
            BriefingEvent::CommitFailed { message, .. } => {
                self.end_line()?;
                eprintln!("Could not save today's ONE Thing: {}", message);
            }
        }
        Ok(())
    }

    /// Close the current assistant line and start fresh for the next turn.
    pub fn end_line(&mut self) -> std::io::Result<()> {
        if !self.printed.is_empty() {
            writeln!(self.out)?;
            self.printed.clear();
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Drop a trailing fragment that may still grow into the opening marker.
fn hold_back_partial_marker(text: &str) -> &str {
    match text.rfind('[') {
        Some(start) if SELECTION_OPEN.starts_with(&text[start..]) => text[..start].trim_end(),
        _ => text,
    }
}

async fn drive_turn<F, W>(
    turn: F,
    events: &mut UnboundedReceiver<BriefingEvent>,
    printer: &mut TurnPrinter<W>,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
    W: Write,
{
    tokio::pin!(turn);
    loop {
        tokio::select! {
            _ = &mut turn => break,
            Some(event) = events.recv() => printer.handle(event)?,
        }
    }
    while let Ok(event) = events.try_recv() {
        printer.handle(event)?;
    }
    Ok(())
}

pub async fn run_briefing(api: &ApiClient) -> Result<()> {
    let tasks = api.list_tasks().await?;
    if tasks.is_empty() {
        println!("No tasks yet. Add one with `onething add <title>` first.");
        return Ok(());
    }

    let driver = BriefingDriver::new(
        Arc::new(HttpBriefingTransport::with_client(
            api.http_client(),
            api.base_url(),
        )),
        Arc::new(api.clone()),
        tasks,
    );
    let mut events = driver.subscribe();
    let mut printer = TurnPrinter::new(std::io::stdout());

    drive_turn(driver.start(), &mut events, &mut printer).await?;
    printer.end_line()?;
    printer.opening_done();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !driver.state().is_complete {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }

        drive_turn(driver.send(text), &mut events, &mut printer).await?;
        printer.end_line()?;
    }

    driver.reset();
    Ok(())
}
