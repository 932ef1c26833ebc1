use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use ledger_core::{Ledger, RANKS, RankProgress, Task, is_overdue, tasks_due_on};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::journal::Journal;

const HELP: &str = "Commands:\n\
- /list             show tasks\n\
- /toggle <id>      flip pending/completed\n\
- /rm <id>          delete a task\n\
- /stats            completion and credit yield\n\
- /rank             current rank and next tier\n\
- /calendar [date]  tasks due on YYYY-MM-DD (default today) or in YYYY-MM\n\
- /quit\n\
\nAnything else is sent to the AI core, e.g. \"Add a task to review Q3 dividends by Monday\".";

pub async fn run_shell(mut ledger: Ledger, mut journal: Option<Journal>) -> Result<()> {
    println!("NEON LEDGER // financial operations interface");
    println!("type /help for commands");
    if let Some(j) = journal.as_ref() {
        println!("journal: {}", j.dir().display());
    }
    println!();
    println!("{}\n", render_rank(&ledger.rank_progress()));
    println!("{}", render_list(ledger.store().tasks(), ledger.today()));
    println!("\n> {}", ledger.system_message());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n>_ ");
        io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "/quit" | "/exit") {
            break;
        }

        if let Some(out) = handle_slash(&mut ledger, input) {
            println!("{out}");
            continue;
        }

        if let Some(j) = journal.as_mut() {
            j.append_command(ledger.today(), &line)?;
        }

        println!("Encrypting transmission... Uploading to Neural Net...");
        match ledger.submit(&line).await.map(str::to_string) {
            Ok(msg) => {
                println!("> {msg}\n");
                println!("{}", render_list(ledger.store().tasks(), ledger.today()));
                println!("\n{}", render_rank(&ledger.rank_progress()));
            }
            Err(e) => {
                warn!(error = %e, "command failed");
                println!("> {}", e.user_message());
            }
        }

        if let Some(j) = journal.as_mut() {
            j.append_reply(ledger.today(), ledger.system_message())?;
        }
    }

    Ok(())
}

/// Local commands that never reach the AI core. `None` means "not a slash
/// command".
pub fn handle_slash(ledger: &mut Ledger, input: &str) -> Option<String> {
    let s = input.trim();
    if !s.starts_with('/') {
        return None;
    }

    let mut parts = s.split_whitespace();
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next();
    let today = ledger.today();

    let out = match (cmd, arg) {
        ("/help", _) => HELP.to_string(),
        ("/list", _) => render_list(ledger.store().tasks(), today),
        ("/toggle", Some(id)) => match ledger.toggle(id).map(|t| t.status) {
            Some(status) => format!("{id} -> {} | score {}", status.as_str(), ledger.store().score()),
            None => format!("no task with id {id}"),
        },
        ("/rm", Some(id)) => match ledger.remove(id) {
            Some(t) => format!("removed {} ({})", t.id, t.title),
            None => format!("no task with id {id}"),
        },
        ("/toggle" | "/rm", None) => format!("usage: {cmd} <id>"),
        ("/stats", _) => render_stats(ledger),
        ("/rank", _) => render_rank(&ledger.rank_progress()),
        ("/calendar", arg) => render_calendar(ledger.store().tasks(), arg, today),
        _ => "Unknown command. Try /help".to_string(),
    };
    Some(out)
}

pub fn render_task(t: &Task, today: NaiveDate) -> String {
    let check = if t.is_completed() { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{check} {:<8} {:<4} {:>5}cr  {}",
        t.id,
        t.priority.as_str().to_uppercase(),
        t.credits,
        t.title
    );
    if let Some(d) = t.deadline {
        line.push_str(&format!("  (due {})", d.format("%Y-%m-%d")));
        if is_overdue(t, today) {
            line.push_str(" OVERDUE");
        }
    }
    if !t.insight.is_empty() && !t.is_completed() {
        line.push_str(&format!("\n      ~ {}", t.insight));
    }
    line
}

pub fn render_list(tasks: &[Task], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return "NO ACTIVE DIRECTIVES".to_string();
    }
    tasks
        .iter()
        .map(|t| render_task(t, today))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_rank(p: &RankProgress) -> String {
    format!(
        "RANK {} | {} / {} XP ({}%) | next: {}",
        p.current.name,
        p.score,
        p.target,
        p.percent,
        p.next_name()
    )
}

pub fn render_ranks_table() -> String {
    RANKS
        .iter()
        .map(|r| format!("{:>6}  {}", r.threshold, r.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_stats(ledger: &Ledger) -> String {
    let s = ledger.stats();
    format!(
        "efficiency   {}% ({} of {} complete, {} pending, {} overdue)\n\
credit yield {}% ({} / {} cr)\n\
priority     high {} | med {} | low {}",
        s.completion_rate,
        s.completed,
        s.total,
        s.pending,
        s.overdue,
        s.yield_percent(),
        s.earned_credits,
        s.potential_credits,
        s.by_priority.high,
        s.by_priority.med,
        s.by_priority.low
    )
}

fn render_calendar(tasks: &[Task], arg: Option<&str>, today: NaiveDate) -> String {
    let arg = arg.unwrap_or_default();

    if let Ok(day) = NaiveDate::parse_from_str(arg, "%Y-%m-%d") {
        return render_day(tasks, day, today);
    }
    if arg.is_empty() {
        return render_day(tasks, today, today);
    }

    // YYYY-MM
    let Ok(first) = NaiveDate::parse_from_str(&format!("{arg}-01"), "%Y-%m-%d") else {
        return format!("bad date '{arg}' (use YYYY-MM-DD or YYYY-MM)");
    };
    let mut dated: Vec<&Task> = tasks
        .iter()
        .filter(|t| {
            t.deadline
                .is_some_and(|d| d.year() == first.year() && d.month() == first.month())
        })
        .collect();
    if dated.is_empty() {
        return format!("{}: nothing scheduled", first.format("%b %Y").to_string().to_uppercase());
    }
    dated.sort_by_key(|t| t.deadline);

    let mut out = format!("TIMELINE // {}", first.format("%b %Y").to_string().to_uppercase());
    for t in dated {
        out.push('\n');
        out.push_str(&render_task(t, today));
    }
    out
}

fn render_day(tasks: &[Task], day: NaiveDate, today: NaiveDate) -> String {
    let due = tasks_due_on(tasks, day);
    if due.is_empty() {
        return format!("{}: nothing due", day.format("%Y-%m-%d"));
    }
    let mut out = format!("{}:", day.format("%Y-%m-%d"));
    for t in due {
        out.push('\n');
        out.push_str(&render_task(t, today));
    }
    out
}
