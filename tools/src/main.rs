//! settlement-runner: headless settlement runner.
//!
//! Usage:
//!   settlement-runner --input demos/period.json --policy margin-band
//!   settlement-runner --input period.json --passphrase <secret> --json
//!   settlement-runner --ipc-mode --db session.db [--resume <session-id>]
//!
//! The agency passphrase is read from SETTLEMENT_AGENCY_PASSPHRASE.
//! Without it, only the consultant view is available.

use anyhow::{Context, Result};
use commission_core::{
    access::{AccessLevel, Authorizer, ConsultantOnly, PassphraseAuthorizer},
    report::{self, ExportFormat},
    store::SessionStore,
    types::EntryId,
    NewDiscountEntry, PolicyConfig, SettlementError, SettlementInput, SettlementSession,
};
use std::env;
use std::io::{self, BufRead, Write};

const PASSPHRASE_VAR: &str = "SETTLEMENT_AGENCY_PASSPHRASE";

/// One-shot input file: the period's figures plus any authorized discounts.
#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct PeriodFile {
    #[serde(flatten)]
    input:     SettlementInput,
    discounts: Vec<NewDiscountEntry>,
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    UpdateInput {
        input: SettlementInput,
    },
    AddDiscount {
        entry: NewDiscountEntry,
    },
    RemoveDiscount {
        id: EntryId,
    },
    Unlock {
        passphrase: String,
    },
    Export {
        format: ExportFormat,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let json_out = args.iter().any(|a| a == "--json");
    let policy_arg = string_arg(&args, "--policy").unwrap_or("margin-band");
    let input_path = string_arg(&args, "--input");
    let passphrase = string_arg(&args, "--passphrase");
    let db = string_arg(&args, "--db");
    let resume = string_arg(&args, "--resume");

    let policy = load_policy(policy_arg)?;

    let authorizer: Box<dyn Authorizer> = match PassphraseAuthorizer::from_env(PASSPHRASE_VAR) {
        Some(auth) => Box::new(auth),
        None => {
            log::info!("{PASSPHRASE_VAR} not set; agency view disabled");
            Box::new(ConsultantOnly)
        }
    };
    let access = AccessLevel::from_credential(authorizer.as_ref(), passphrase);

    let mut session = open_session(policy, db, resume)?;

    if let Some(path) = input_path {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {path}"))?;
        let period: PeriodFile = serde_json::from_str(&content)
            .with_context(|| format!("Cannot parse {path}"))?;
        session.update_input(period.input)?;
        for entry in period.discounts {
            if let Err(e) = session.add_discount(entry) {
                eprintln!("skipped authorized discount: {e}");
            }
        }
    }

    if ipc_mode {
        run_ipc_loop(&mut session, authorizer.as_ref(), access)
    } else {
        print_report(&mut session, access, json_out)
    }
}

fn load_policy(arg: &str) -> Result<PolicyConfig> {
    match PolicyConfig::builtin(arg) {
        Some(policy) => Ok(policy),
        None => PolicyConfig::load(arg),
    }
}

fn open_session(
    policy: PolicyConfig,
    db: Option<&str>,
    resume: Option<&str>,
) -> Result<SettlementSession> {
    let Some(path) = db else {
        return Ok(SettlementSession::new(policy));
    };
    let store = SessionStore::open(path)?;
    store.migrate()?;
    let session = match resume {
        Some(id) => SettlementSession::resume(id, policy, store)?,
        None => SettlementSession::with_store(policy, store)?,
    };
    Ok(session)
}

fn print_report(session: &mut SettlementSession, access: AccessLevel, json_out: bool) -> Result<()> {
    let format = if json_out { ExportFormat::Json } else { ExportFormat::Text };
    match session.export(access, format) {
        Ok(rendered) => println!("{rendered}"),
        Err(SettlementError::Validation(errors)) => {
            // Export is blocked, but the figures are still useful on screen.
            eprintln!("report not exportable:");
            for e in &errors {
                eprintln!("  {e}");
            }
            let result = session.settle()?;
            println!("{}", report::render_consultant_report(&result));
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn run_ipc_loop(
    session: &mut SettlementSession,
    authorizer: &dyn Authorizer,
    mut access: AccessLevel,
) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => build_state(session, access),
            IpcCommand::UpdateInput { input } => {
                session.update_input(input).and_then(|_| build_state(session, access))
            }
            IpcCommand::AddDiscount { entry } => {
                session.add_discount(entry).and_then(|_| build_state(session, access))
            }
            IpcCommand::RemoveDiscount { id } => {
                session.remove_discount(id).and_then(|_| build_state(session, access))
            }
            IpcCommand::Unlock { passphrase } => {
                access = AccessLevel::from_credential(authorizer, Some(&passphrase));
                build_state(session, access)
            }
            IpcCommand::Export { format } => session
                .export(access, format)
                .map(|rendered| serde_json::json!({ "report": rendered })),
        };

        let json = match reply {
            Ok(state) => state,
            Err(SettlementError::Validation(errors)) => {
                serde_json::json!({ "error": "validation failed", "fields": errors })
            }
            Err(e @ SettlementError::EntryNotFound { .. }) => {
                serde_json::json!({ "error": e.to_string() })
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(stdout, "{}", json)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_state(
    session: &mut SettlementSession,
    access: AccessLevel,
) -> commission_core::EngineResult<serde_json::Value> {
    let result = session.settle()?;
    let view = match access {
        AccessLevel::Consultant => serde_json::to_value(report::consultant_view(&result))?,
        AccessLevel::Agency => serde_json::to_value(report::agency_view(&result))?,
    };
    Ok(serde_json::json!({
        "session_id": session.session_id(),
        "policy_id":  result.policy_id,
        "access":     access,
        "identity_errors": result.input.identity.validate(),
        "settlement": view,
    }))
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
