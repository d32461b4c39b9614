//! End-to-end scenarios exercised through the public engine surface and the
//! line protocol, the way the front-end drives a live book.

use matchbook::{
    Engine, EngineConfig, EngineWorker, OrderType, Reply, SharedSink, Side, dispatch, write_reply,
};

fn test_engine() -> (Engine, SharedSink) {
    let sink = SharedSink::new();
    let config = EngineConfig {
        order_id_ceiling: 100_000,
        account_cap: 1_000,
        store_chunk: 64,
        ..EngineConfig::default()
    };
    (Engine::new(config, Box::new(sink.clone())), sink)
}

fn cents_of(engine: &Engine, name: &str) -> i64 {
    engine
        .scores()
        .into_iter()
        .find(|row| row.name == name)
        .map(|row| i64::from(row.cents))
        .expect("account on scoreboard")
}

#[test]
fn simple_cross() {
    let (mut engine, _sink) = test_engine();

    let buy = engine
        .place_order("alice", 0, 100, 5000, Side::Buy, OrderType::Limit)
        .unwrap();
    let view = engine.order_view(buy).unwrap();
    assert!(view.open);

    let sell = engine
        .place_order("bob", 1, 100, 5000, Side::Sell, OrderType::Limit)
        .unwrap();

    let buy_view = engine.order_view(buy).unwrap();
    let sell_view = engine.order_view(sell).unwrap();
    assert!(!buy_view.open);
    assert!(!sell_view.open);
    assert_eq!(buy_view.fills.len(), 1);
    assert_eq!(sell_view.fills.len(), 1);
    assert_eq!(buy_view.fills[0].price, 5000);
    assert_eq!(buy_view.fills[0].qty, 100);

    let quote = engine.quote_view();
    assert_eq!(quote.bid, None);
    assert_eq!(quote.ask, None);
    assert_eq!(quote.last, Some(5000));
    assert_eq!(quote.last_size, Some(100));
}

#[test]
fn price_improvement_accrues_to_the_incoming_order() {
    let (mut engine, _sink) = test_engine();

    engine
        .place_order("alice", 0, 10, 100, Side::Buy, OrderType::Limit)
        .unwrap();
    let sell = engine
        .place_order("bob", 1, 10, 90, Side::Sell, OrderType::Limit)
        .unwrap();

    let view = engine.order_view(sell).unwrap();
    assert_eq!(view.total_filled, 10);
    assert_eq!(view.fills[0].price, 100);

    assert_eq!(cents_of(&engine, "bob"), 1000);
    assert_eq!(cents_of(&engine, "alice"), -1000);
}

#[test]
fn partial_fill_with_fifo_priority() {
    let (mut engine, _sink) = test_engine();

    let a = engine
        .place_order("alice", 0, 50, 100, Side::Buy, OrderType::Limit)
        .unwrap();
    let b = engine
        .place_order("bob", 1, 50, 100, Side::Buy, OrderType::Limit)
        .unwrap();
    let c = engine
        .place_order("carol", 2, 70, 100, Side::Sell, OrderType::Limit)
        .unwrap();

    let a = engine.order_view(a).unwrap();
    let b = engine.order_view(b).unwrap();
    let c = engine.order_view(c).unwrap();

    assert!(!a.open);
    assert_eq!(a.total_filled, 50);
    assert!(b.open);
    assert_eq!(b.total_filled, 20);
    assert_eq!(b.qty, 30);
    assert!(!c.open);
    assert_eq!(c.total_filled, 70);

    let quote = engine.quote_view();
    assert_eq!(quote.bid, Some(100));
    assert_eq!(quote.bid_size, 30);
}

#[test]
fn ioc_discards_residual_against_an_empty_side() {
    let (mut engine, _sink) = test_engine();

    let id = engine
        .place_order("alice", 0, 100, 50, Side::Buy, OrderType::Ioc)
        .unwrap();
    let view = engine.order_view(id).unwrap();

    assert_eq!(view.total_filled, 0);
    assert!(!view.open);
    assert_eq!(view.qty, 0);
    assert_eq!(engine.quote_view().bid, None);
}

#[test]
fn fok_fails_atomically_when_volume_is_short() {
    let (mut engine, _sink) = test_engine();

    engine
        .place_order("alice", 0, 30, 100, Side::Sell, OrderType::Limit)
        .unwrap();
    engine
        .place_order("alice", 0, 30, 101, Side::Sell, OrderType::Limit)
        .unwrap();

    let id = engine
        .place_order("bob", 1, 80, 101, Side::Buy, OrderType::Fok)
        .unwrap();
    let view = engine.order_view(id).unwrap();
    assert_eq!(view.total_filled, 0);
    assert!(!view.open);

    // The book is exactly as it was.
    let quote = engine.quote_view();
    assert_eq!(quote.ask, Some(100));
    assert_eq!(quote.ask_size, 30);
    assert_eq!(quote.ask_depth, 60);
}

#[test]
fn self_trade_fills_without_moving_the_ledger() {
    let (mut engine, _sink) = test_engine();

    let buy = engine
        .place_order("alice", 0, 10, 100, Side::Buy, OrderType::Limit)
        .unwrap();
    let sell = engine
        .place_order("alice", 0, 10, 100, Side::Sell, OrderType::Limit)
        .unwrap();

    assert_eq!(engine.order_view(buy).unwrap().total_filled, 10);
    assert_eq!(engine.order_view(sell).unwrap().total_filled, 10);

    let row = engine
        .scores()
        .into_iter()
        .find(|row| row.name == "alice")
        .unwrap();
    assert_eq!(row.shares, 0);
    assert_eq!(row.cents, 0);

    let quote = engine.quote_view();
    assert_eq!(quote.last, Some(100));
    assert_eq!(quote.last_size, Some(10));
}

#[test]
fn saturation_clamps_positions_without_wrapping() {
    let (mut engine, _sink) = test_engine();
    let huge = i64::from(u32::MAX);

    for _ in 0..3 {
        engine
            .place_order("seller", 0, huge, 1_000_000, Side::Sell, OrderType::Limit)
            .unwrap();
        engine
            .place_order("buyer", 1, huge, 1_000_000, Side::Buy, OrderType::Limit)
            .unwrap();
    }

    let rows = engine.scores();
    let seller = rows.iter().find(|r| r.name == "seller").unwrap();
    let buyer = rows.iter().find(|r| r.name == "buyer").unwrap();
    assert_eq!(seller.shares, -i32::MAX);
    assert_eq!(seller.cents, i32::MAX);
    assert_eq!(buyer.shares, i32::MAX);
    assert_eq!(buyer.cents, -i32::MAX);
    assert_eq!(seller.posmin, -i32::MAX);
    assert_eq!(buyer.posmax, i32::MAX);
}

#[test]
fn protocol_round_trip_over_the_dispatcher() {
    let (mut engine, _sink) = test_engine();

    let reply = dispatch(&mut engine, "ORDER alice 0 100 5000 1 1");
    let Reply::Framed(payload) = reply else {
        panic!("expected a framed reply");
    };
    assert!(payload.contains("\"ok\":true"));
    assert!(payload.contains("\"open\":true"));

    let reply = dispatch(&mut engine, "ORDER bob 1 100 5000 2 1");
    let Reply::Framed(payload) = reply else {
        panic!("expected a framed reply");
    };
    assert!(payload.contains("\"open\":false"));
    assert!(payload.contains("\"totalFilled\":100"));

    let Reply::Framed(quote) = dispatch(&mut engine, "QUOTE") else {
        panic!("expected a framed reply");
    };
    assert!(quote.contains("\"last\":5000"));
    assert!(quote.contains("\"lastSize\":100"));
}

#[test]
fn binary_book_streams_both_sides_with_terminators() {
    let (mut engine, _sink) = test_engine();

    dispatch(&mut engine, "ORDER alice 0 10 100 1 1");
    dispatch(&mut engine, "ORDER alice 0 5 101 1 1");
    dispatch(&mut engine, "ORDER bob 1 7 102 2 1");

    let Reply::Binary(bytes) = dispatch(&mut engine, "ORDERBOOK_BINARY") else {
        panic!("binary book must be a binary reply");
    };
    assert_eq!(bytes.len(), 5 * 8);

    // Best bid (101) first, then 100, then the bid terminator.
    assert_eq!(&bytes[0..8], &[0, 0, 0, 5, 0, 0, 0, 101]);
    assert_eq!(&bytes[8..16], &[0, 0, 0, 10, 0, 0, 0, 100]);
    assert_eq!(&bytes[16..24], &[0u8; 8]);
    assert_eq!(&bytes[24..32], &[0, 0, 0, 7, 0, 0, 0, 102]);
    assert_eq!(&bytes[32..40], &[0u8; 8]);
}

#[test]
fn event_feed_frames_executions_then_ticker() {
    let (mut engine, sink) = test_engine();

    dispatch(&mut engine, "ORDER alice 0 10 100 1 1");
    let before = sink.contents().len();
    dispatch(&mut engine, "ORDER bob 1 10 100 2 1");

    let feed = sink.contents()[before..].to_string();
    let lines: Vec<&str> = feed.lines().collect();

    // Two execution frames then one ticker frame, each END-terminated.
    assert_eq!(lines[0], "EXECUTION alice TESTEX FOOBAR");
    assert_eq!(lines[2], "END");
    assert_eq!(lines[3], "EXECUTION bob TESTEX FOOBAR");
    assert_eq!(lines[5], "END");
    assert_eq!(lines[6], "TICKER NONE TESTEX FOOBAR");
    assert!(lines[7].starts_with("{\"ok\":true,\"quote\":{"));
    assert_eq!(lines[8], "END");

    assert!(lines[1].contains("\"standingComplete\":true"));
    assert!(lines[1].contains("\"incomingComplete\":true"));
    assert!(lines[4].contains("\"filled\":10"));
}

#[test]
fn worker_serializes_the_whole_protocol() {
    let sink = SharedSink::new();
    let config = EngineConfig::for_book("WORKEX", "CAT");
    let engine = Engine::new(config, Box::new(sink.clone()));
    let (client, handle) = EngineWorker::start(engine);

    let reply = client.submit("ORDER alice 0 10 100 1 1").unwrap();
    let mut framed = Vec::new();
    write_reply(&mut framed, &reply).unwrap();
    let framed = String::from_utf8(framed).unwrap();
    assert!(framed.ends_with("\nEND\n"));
    assert!(framed.contains("\"venue\":\"WORKEX\""));

    let reply = client.submit("__ACC_FROM_ID__ 0").unwrap();
    assert_eq!(reply, Reply::Framed("OK alice".to_string()));

    let reply = client.submit("NONSENSE").unwrap();
    assert_eq!(
        reply,
        Reply::Framed("{\"ok\":false,\"error\":\"Did not comprehend\"}".to_string())
    );

    drop(client);
    handle.join().unwrap();
}

#[test]
fn cancel_through_the_protocol_updates_the_quote() {
    let (mut engine, _sink) = test_engine();

    dispatch(&mut engine, "ORDER alice 0 10 100 1 1");
    let Reply::Framed(reply) = dispatch(&mut engine, "CANCEL 0") else {
        panic!("expected a framed reply");
    };
    assert!(reply.contains("\"open\":false"));
    assert!(reply.contains("\"qty\":0"));

    let Reply::Framed(quote) = dispatch(&mut engine, "QUOTE") else {
        panic!("expected a framed reply");
    };
    assert!(!quote.contains("\"bid\":"));
    assert!(quote.contains("\"bidDepth\":0"));
}
