//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The command dispatcher: one newline-terminated command in, one reply out. Commands are
// whitespace-tokenized; every reply is a payload followed by a line containing END and a flush,
// with the binary order book as the only unframed exception.
//
// | Verb              | Reply                                              |
// |-------------------|----------------------------------------------------|
// | ORDER             | order JSON or an admission error                   |
// | CANCEL            | the (now closed) order JSON or No such ID          |
// | STATUS            | order JSON or No such ID                           |
// | STATUSALL         | every order the account ever placed                |
// | QUOTE             | quote JSON                                         |
// | ORDERBOOK_BINARY  | raw binary book, unframed                          |
// | __ACC_FROM_ID__   | OK <name> or ERROR None                            |
// | __SCORES__        | HTML scoreboard                                    |
// | __DEBUG_MEMORY__  | entity and arena counts                            |
// | __TIMESTAMP__     | current engine timestamp                           |
//--------------------------------------------------------------------------------------------------

use std::fmt::Write as _;
use std::io::{self, Write};

use serde::Serialize;
use tracing::{debug, error};

use crate::domain::models::types::{AccountId, OrderId, OrderType, Side};
use crate::domain::models::views::ErrorView;
use crate::domain::services::matching_engine::Engine;

/// One reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A payload to be followed by the END frame marker.
    Framed(String),
    /// Raw bytes written as-is, with no frame marker.
    Binary(Vec<u8>),
}

/// Processes one command line against the engine and returns its reply.
pub fn dispatch(engine: &mut Engine, line: &str) -> Reply {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&verb) = tokens.first() else {
        return incomprehensible();
    };
    debug!(verb, "dispatching command");

    match verb {
        "ORDER" => order_cmd(engine, &tokens[1..]),
        "CANCEL" => cancel_cmd(engine, &tokens[1..]),
        "STATUS" => status_cmd(engine, &tokens[1..]),
        "STATUSALL" => status_all_cmd(engine, &tokens[1..]),
        "QUOTE" => Reply::Framed(json(&engine.quote_view())),
        "ORDERBOOK_BINARY" => Reply::Binary(engine.orderbook_binary()),
        "__ACC_FROM_ID__" => acc_from_id_cmd(engine, &tokens[1..]),
        "__SCORES__" => Reply::Framed(scoreboard(engine)),
        "__DEBUG_MEMORY__" => Reply::Framed(json(&engine.debug_memory())),
        "__TIMESTAMP__" => Reply::Framed(json(&engine.timestamp())),
        _ => incomprehensible(),
    }
}

/// Writes one reply to the reply sink, framing and flushing as the protocol
/// requires.
pub fn write_reply<W: Write>(out: &mut W, reply: &Reply) -> io::Result<()> {
    match reply {
        Reply::Framed(payload) => {
            writeln!(out, "{payload}")?;
            writeln!(out, "END")?;
            out.flush()
        }
        Reply::Binary(bytes) => {
            out.write_all(bytes)?;
            out.flush()
        }
    }
}

fn incomprehensible() -> Reply {
    error_reply("Did not comprehend")
}

fn error_reply(message: &str) -> Reply {
    Reply::Framed(json(&ErrorView::new(message)))
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        error!(%err, "reply serialization failed");
        "{\"ok\":false,\"error\":\"Internal JSON error\"}".to_string()
    })
}

/// ORDER name account qty price dir(1|2) type(1..4)
fn order_cmd(engine: &mut Engine, args: &[&str]) -> Reply {
    if args.len() != 6 {
        return error_reply("SILLY_VALUE");
    }
    let name = args[0];
    let (Ok(account), Ok(qty), Ok(price), Ok(dir_code), Ok(type_code)) = (
        args[1].parse::<u64>(),
        args[2].parse::<i64>(),
        args[3].parse::<i64>(),
        args[4].parse::<u32>(),
        args[5].parse::<u32>(),
    ) else {
        return error_reply("SILLY_VALUE");
    };
    let (Some(direction), Some(order_type)) =
        (Side::from_code(dir_code), OrderType::from_code(type_code))
    else {
        return error_reply("SILLY_VALUE");
    };
    let Ok(account) = AccountId::try_from(account) else {
        return error_reply("TOO_HIGH_ACCOUNT");
    };

    match engine.place_order(name, account, qty, price, direction, order_type) {
        Ok(id) => order_reply(engine, id),
        Err(err) => error_reply(&err.to_string()),
    }
}

fn order_reply(engine: &Engine, id: OrderId) -> Reply {
    match engine.order_view(id) {
        Some(view) => Reply::Framed(json(&view)),
        None => error_reply("No such ID"),
    }
}

/// CANCEL id
fn cancel_cmd(engine: &mut Engine, args: &[&str]) -> Reply {
    let Some(id) = parse_order_id(args) else {
        return error_reply("No such ID");
    };
    match engine.cancel_order(id) {
        Ok(id) => order_reply(engine, id),
        Err(err) => error_reply(&err.to_string()),
    }
}

/// STATUS id
fn status_cmd(engine: &Engine, args: &[&str]) -> Reply {
    let Some(id) = parse_order_id(args) else {
        return error_reply("No such ID");
    };
    match engine.order_view(id) {
        Some(view) => Reply::Framed(json(&view)),
        None => error_reply("No such ID"),
    }
}

/// STATUSALL account
fn status_all_cmd(engine: &Engine, args: &[&str]) -> Reply {
    let Some(account) = parse_account_id(args) else {
        return error_reply("Account not known on this book");
    };
    match engine.status_all(account) {
        Ok(view) => Reply::Framed(json(&view)),
        Err(err) => error_reply(&err.to_string()),
    }
}

/// __ACC_FROM_ID__ id
fn acc_from_id_cmd(engine: &Engine, args: &[&str]) -> Reply {
    let name = parse_account_id(args).and_then(|id| engine.account_name(id));
    match name {
        Some(name) => Reply::Framed(format!("OK {name}")),
        None => Reply::Framed("ERROR None".to_string()),
    }
}

fn parse_order_id(args: &[&str]) -> Option<OrderId> {
    args.first()?.parse::<u64>().ok()?.try_into().ok()
}

fn parse_account_id(args: &[&str]) -> Option<AccountId> {
    args.first()?.parse::<u64>().ok()?.try_into().ok()
}

/// Renders the human-readable scoreboard, best NAV first.
fn scoreboard(engine: &Engine) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<html><head><title>{venue} {symbol}</title></head><body>\
         <h1>{venue} {symbol} scores</h1><table border=\"1\">\
         <tr><th>Account</th><th>Shares</th><th>Cents</th>\
         <th>Posmin</th><th>Posmax</th><th>NAV</th></tr>",
        venue = engine.venue(),
        symbol = engine.symbol(),
    );
    for row in engine.scores() {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.name, row.shares, row.cents, row.posmin, row.posmax, row.nav,
        );
    }
    html.push_str("</table></body></html>");
    html
}
