//! End-to-end host operation dispatch against a fake canvas resource

use imgscript_core::actor::{CollectionConfig, Item, ItemId, MemorySink, TaskError};
use imgscript_core::args::{ParsedArgs, Value};
use imgscript_core::{DispatchError, Dispatcher, HostError, HostOp, RuntimeConfig};
use imgscript_test_utils::{draw_signature, resize_signature, Canvas};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn canvas_dispatcher() -> (Dispatcher<Canvas>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let dispatcher =
        Dispatcher::from_config_with_sink(&RuntimeConfig::default(), sink.clone()).unwrap();

    dispatcher
        .register(HostOp::new(
            resize_signature(),
            |item: &mut Item<Canvas>, args: &ParsedArgs| {
                let width = args.int("width").map_err(|e| HostError::failed(e.to_string()))?;
                let height = args.int("height").map_err(|e| HostError::failed(e.to_string()))?;
                if width <= 0 || height <= 0 {
                    return Err(HostError::invalid("width", "dimensions must be positive"));
                }
                let filter = args
                    .table("opts")
                    .and_then(|opts| opts.str("filter"))
                    .unwrap_or_default();

                let canvas = item.get_or_insert_with(|| Canvas::new(1, 1));
                canvas.width = width;
                canvas.height = height;
                canvas.apply(if filter.is_empty() {
                    "resize".to_string()
                } else {
                    format!("resize:{filter}")
                });
                Ok(Value::table([
                    ("width", Value::from(width)),
                    ("height", Value::from(height)),
                ]))
            },
        ))
        .unwrap();

    dispatcher
        .register(HostOp::new(
            draw_signature(),
            |item: &mut Item<Canvas>, args: &ParsedArgs| {
                let id = item.id();
                let canvas = item.get_mut().ok_or(HostError::NoResource(id))?;
                let ops = args.list("ops").map_err(|e| HostError::failed(e.to_string()))?;
                for op in ops {
                    canvas.apply(op.as_str().unwrap_or_default());
                }
                Ok(Value::from(i64::try_from(canvas.ops.len()).unwrap_or(i64::MAX)))
            },
        ))
        .unwrap();

    dispatcher
        .define(
            "canvas",
            "crash",
            vec![],
            |_: &mut Item<Canvas>, _: &ParsedArgs| -> Result<Value, HostError> {
                panic!("decoder state corrupted")
            },
        )
        .unwrap();

    (dispatcher, sink)
}

/// Tenet: a script call parses, runs on the item and returns the handler's value.
#[tokio::test]
async fn calls_flow_through_to_the_resource() {
    let (dispatcher, _) = canvas_dispatcher();
    let poster = dispatcher.open("poster.png").unwrap();

    let dims = dispatcher
        .call(
            "canvas",
            "resize",
            poster,
            &[Value::from(640), Value::from(480), Value::from(json!({ "filter": "lanczos" }))],
        )
        .await
        .unwrap();
    assert_eq!(dims, Value::from(json!({ "width": 640, "height": 480 })));

    let count = dispatcher
        .call("canvas", "draw", poster, &[Value::from("line"), Value::from("fill")])
        .await
        .unwrap();
    assert_eq!(count, Value::Int(3));

    let ops = dispatcher
        .collection()
        .run(
            poster,
            imgscript_core::actor::Task::new("test", "ops", |item: &mut Item<Canvas>| {
                item.get().map(|c| c.ops.clone())
            }),
        )
        .await
        .unwrap();
    assert_eq!(
        ops,
        Some(vec![
            "resize:lanczos".to_string(),
            "line".to_string(),
            "fill".to_string()
        ])
    );
}

/// Tenet: submitted calls on one item complete in submission order.
#[tokio::test]
async fn submitted_calls_complete_in_order() {
    let (dispatcher, _) = canvas_dispatcher();
    let id = dispatcher.open("strip").unwrap();

    let resize = dispatcher
        .submit("canvas", "resize", id, &[Value::from(10), Value::from(10)])
        .await
        .unwrap();
    let mut draws = Vec::new();
    for n in 0..5 {
        let op = format!("op{n}");
        draws.push(
            dispatcher
                .submit("canvas", "draw", id, &[Value::from(op)])
                .await
                .unwrap(),
        );
    }

    resize.await.unwrap().unwrap();
    let mut counts = Vec::new();
    for draw in draws {
        counts.push(draw.await.unwrap().unwrap());
    }
    assert_eq!(
        counts,
        (2..=6).map(Value::Int).collect::<Vec<_>>()
    );
}

/// Tenet: handler failures name the operation; the item stays usable.
#[tokio::test]
async fn handler_errors_are_reported_with_operation_name() {
    let (dispatcher, _) = canvas_dispatcher();
    let id = dispatcher.open("empty").unwrap();

    let err = dispatcher
        .call("canvas", "draw", id, &[Value::from("line")])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("canvas.draw failed: item {id} holds no resource")
    );
    assert!(err.is_script_error());

    let err = dispatcher
        .call("canvas", "resize", id, &[Value::from(0), Value::from(5)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Host { source: HostError::InvalidArgument { .. }, .. }
    ));

    dispatcher
        .call("canvas", "resize", id, &[Value::from(5), Value::from(5)])
        .await
        .unwrap();
}

/// Tenet: argument errors are script errors and nothing is scheduled.
#[tokio::test]
async fn argument_errors_are_script_errors() {
    let (dispatcher, sink) = canvas_dispatcher();
    let id = dispatcher.open("poster").unwrap();

    let err = dispatcher
        .call("canvas", "resize", id, &[Value::from("wide"), Value::from(5)])
        .await
        .unwrap_err();

    assert!(err.is_script_error());
    match err {
        DispatchError::Args(arg) => assert_eq!(arg.arg(), Some("width")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(sink.count("task scheduled"), 0);
}

/// Tenet: a panicking handler closes its item and later calls are rejected.
#[tokio::test]
async fn panicking_handler_closes_the_item() {
    let (dispatcher, _) = canvas_dispatcher();
    let doomed = dispatcher.open("doomed").unwrap();
    let other = dispatcher.open("other").unwrap();

    let err = dispatcher.call("canvas", "crash", doomed, &[]).await.unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Task(TaskError::Panicked { ref message, .. }) if message == "decoder state corrupted"
    ));

    let err = dispatcher
        .call("canvas", "resize", doomed, &[Value::from(1), Value::from(1)])
        .await
        .unwrap_err();
    assert!(err.is_item_closed());

    dispatcher
        .call("canvas", "resize", other, &[Value::from(2), Value::from(2)])
        .await
        .unwrap();

    let report = dispatcher.shutdown().await.unwrap();
    assert_eq!((report.collected, report.skipped), (1, 1));
}

/// Tenet: shutdown runs the collect hook for each open item.
#[test]
fn blocking_shutdown_collects_everything() {
    let (dispatcher, sink) = canvas_dispatcher();
    let ids: Vec<ItemId> = (0..3)
        .map(|n| dispatcher.open(&format!("layer-{n}")).unwrap())
        .collect();
    for id in &ids {
        dispatcher
            .blocking_call("canvas", "resize", *id, &[Value::from(8), Value::from(8)])
            .unwrap();
    }

    let report = dispatcher.blocking_shutdown().unwrap();

    assert_eq!(report.collected, 3);
    assert_eq!(sink.count("item collected"), 3);
    for id in ids {
        assert_eq!(dispatcher.collection().is_cleaned(id), Some(true));
    }
}

/// Tenet: the dispatcher honours the configured mailbox size.
#[test]
fn runtime_config_reaches_the_collection() {
    let config = RuntimeConfig::new().with_collection(CollectionConfig::new().with_mailbox_capacity(2));
    let dispatcher: Dispatcher<Canvas> = Dispatcher::from_config(&config).unwrap();
    assert_eq!(dispatcher.collection().config().mailbox_capacity, 2);
}
