use crate::session::{
    ConfirmOutcome, ExecutionReport, ProposalOutcome, Session, SessionEvent, TranslationWorker,
};
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

const PROMPT: &str = "What do you want your PC to do?";
const APOLOGY: &str = "Sorry, I couldn't generate a command for that.";

/// What the user chose for a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Confirm,
    DryRun,
    Cancel,
}

impl Answer {
    fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => Answer::Confirm,
            "d" | "dry" | "dry-run" => Answer::DryRun,
            _ => Answer::Cancel,
        }
    }
}

/// Line-oriented front end over a `Session`.
///
/// Generic over its streams so tests can script a conversation.
pub struct Console<R: BufRead, W: Write> {
    session: Session,
    worker: TranslationWorker,
    events: UnboundedReceiver<SessionEvent>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(
        session: Session,
        worker: TranslationWorker,
        events: UnboundedReceiver<SessionEvent>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            session,
            worker,
            events,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Prompt repeatedly until `exit`, `quit` or end of input
    pub async fn run_interactive(&mut self) -> io::Result<()> {
        loop {
            write!(self.output, "{} ", PROMPT)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return Ok(());
            };

            match line.trim() {
                "" => continue,
                "exit" | "quit" => return Ok(()),
                request => self.handle_request(request).await?,
            }
        }
    }

    /// One full cycle: translate, show, ask, act
    pub async fn handle_request(&mut self, request: &str) -> io::Result<()> {
        let ticket = match self.session.submit(request) {
            Ok(ticket) => ticket,
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                return Ok(());
            }
        };

        writeln!(self.output, "Thinking...")?;
        self.worker.spawn(ticket, request.to_string());

        // Replies for earlier tickets can still be in flight
        let proposal = loop {
            let Some(SessionEvent::TranslationReady { ticket, reply }) = self.events.recv().await
            else {
                writeln!(self.output, "{}", APOLOGY)?;
                self.session.cancel();
                return Ok(());
            };

            match self.session.receive_translation(ticket, reply) {
                ProposalOutcome::Ready(proposal) => break proposal,
                ProposalOutcome::Failed(reason) => {
                    writeln!(self.output, "{}", APOLOGY)?;
                    writeln!(self.output, "({})", reason)?;
                    return Ok(());
                }
                ProposalOutcome::Stale => debug!(ticket = ticket.id(), "dropped stale reply"),
            }
        };

        writeln!(self.output)?;
        writeln!(self.output, "Proposed command: {}", proposal.raw_command())?;
        writeln!(self.output, "Explanation: {}", proposal.explanation())?;

        let question = if self.session.options().dry_run {
            "Simulate it? [y]es / [N]o: "
        } else {
            "Run it? [y]es / [d]ry run / [N]o: "
        };
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let answer = self
            .read_line()?
            .map(|line| Answer::parse(&line))
            .unwrap_or(Answer::Cancel);

        match answer {
            Answer::Confirm => self.confirm()?,
            Answer::DryRun => match self.session.dry_run() {
                Ok(report) => writeln!(self.output, "[DRY RUN] Would run: {}", report.command)?,
                Err(e) => writeln!(self.output, "{}", e)?,
            },
            Answer::Cancel => {
                self.session.cancel();
                writeln!(self.output, "Cancelled.")?;
            }
        }

        Ok(())
    }

    fn confirm(&mut self) -> io::Result<()> {
        match self.session.confirm() {
            Ok(ConfirmOutcome::Executed(report)) => self.print_report(&report),
            Ok(ConfirmOutcome::Blocked(decision)) => {
                let reason = decision.reason.unwrap_or_default();
                writeln!(self.output, "Blocked by safe mode: {}", reason)
            }
            Ok(ConfirmOutcome::Simulated(report)) => {
                writeln!(self.output, "[DRY RUN] Would run: {}", report.command)
            }
            Err(e) => writeln!(self.output, "{}", e),
        }
    }

    fn print_report(&mut self, report: &ExecutionReport) -> io::Result<()> {
        let result = &report.result;

        if !result.stdout.is_empty() {
            write!(self.output, "{}", result.stdout)?;
            if !result.stdout.ends_with('\n') {
                writeln!(self.output)?;
            }
        }

        if result.is_success() {
            writeln!(self.output, "Command completed successfully.")?;
        } else {
            if !result.stderr.is_empty() {
                writeln!(self.output, "Errors:\n{}", result.stderr.trim_end())?;
            }
            if result.timed_out {
                writeln!(self.output, "Command timed out.")?;
            } else {
                writeln!(self.output, "Command failed (exit code: {}).", result.exit_code)?;
            }
        }

        if let Some(ref error) = report.audit_error {
            writeln!(self.output, "Warning: command was not logged: {}", error)?;
        }

        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match self.input.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}
