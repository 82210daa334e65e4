//! Integration tests for handler routing across the full pipeline

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};
use std::thread;
use tagwire::{wire_type, CodecConfig, Dispatcher, Handler, MessageController};
use tagwire::{Result, ServiceCollection, ServiceProvider, TypeRegistry, Value, WireError};

#[derive(Debug, Clone, Default, PartialEq)]
struct Say {
    from: String,
    body: String,
}
wire_type!(Say => "chat.Say" { from: String, body: String });

#[derive(Debug, Clone, Default, PartialEq)]
struct Said {
    tick: u64,
    echo: String,
}
wire_type!(Said => "chat.Said" { tick: u64, echo: String });

#[derive(Debug, Clone, Default, PartialEq)]
struct Notice {
    level: u8,
}
wire_type!(Notice => "chat.Notice" { level: u8 });

/// Shared state handed to handlers through the service collection.
#[derive(Debug, Default)]
struct Room {
    log: Mutex<Vec<String>>,
}

struct SayHandler {
    room: Arc<Room>,
}

impl Handler for SayHandler {
    type Request = Say;
    type Response = Said;

    fn construct(services: &dyn ServiceProvider) -> Result<Self> {
        Ok(Self {
            room: services.resolve::<Room>()?,
        })
    }

    fn process_request(&mut self, request: Say) -> Result<Said> {
        if request.body.is_empty() {
            return Err(WireError::Handler("empty message".into()));
        }
        let mut log = self.room.log.lock().unwrap();
        log.push(format!("{}: {}", request.from, request.body));
        Ok(Said {
            tick: log.len() as u64,
            echo: request.body,
        })
    }

    fn process_response(&mut self, response: Said) -> Result<()> {
        self.room
            .log
            .lock()
            .unwrap()
            .push(format!("ack {}", response.tick));
        Ok(())
    }
}

fn controller() -> (MessageController, Arc<Room>) {
    let room = Arc::new(Room::default());
    let mut services = ServiceCollection::new();
    services.insert_shared(room.clone());

    let registry = TypeRegistry::builder()
        .register::<Say>()
        .register::<Said>()
        .register::<Notice>()
        .build()
        .unwrap();

    let mut dispatcher = Dispatcher::with_services(Arc::new(services));
    dispatcher.register::<SayHandler>().unwrap();

    let controller = MessageController::new(Arc::new(registry), dispatcher, CodecConfig::default());
    controller.ensure_ready().expect("controller should be ready");
    (controller, room)
}

#[test]
fn test_request_roundtrip_through_wire() {
    let (controller, room) = controller();

    let frame = controller
        .encode(&Say {
            from: "ann".into(),
            body: "hello".into(),
        })
        .unwrap();
    let reply = controller.process(&frame).unwrap().expect("request is answered");

    let said = controller
        .decode(&reply)
        .unwrap()
        .and_then(Value::into_object::<Said>)
        .unwrap();
    assert_eq!(
        said,
        Said {
            tick: 1,
            echo: "hello".into()
        }
    );
    assert_eq!(room.log.lock().unwrap().as_slice(), ["ann: hello"]);
}

#[test]
fn test_response_is_consumed_without_reply() {
    let (controller, room) = controller();

    let frame = controller
        .encode(&Said {
            tick: 3,
            echo: String::new(),
        })
        .unwrap();
    assert!(controller.process(&frame).unwrap().is_none());
    assert_eq!(room.log.lock().unwrap().as_slice(), ["ack 3"]);

    let snapshot = controller.metrics().snapshot();
    assert_eq!(snapshot.responses_dispatched, 1);
    assert_eq!(snapshot.requests_dispatched, 0);
}

#[test]
fn test_registered_but_unbound_kind_is_unroutable() {
    let (controller, _) = controller();

    let frame = controller.encode(&Notice { level: 2 }).unwrap();
    let err = controller.process(&frame).unwrap_err();

    assert!(matches!(err, WireError::UnroutableMessage(ref kind) if kind == "chat.Notice"));
    assert!(!err.is_fatal());
    assert_eq!(controller.metrics().snapshot().unroutable, 1);
}

#[test]
fn test_handler_failure_is_reported() {
    let (controller, room) = controller();

    let frame = controller
        .encode(&Say {
            from: "bob".into(),
            body: String::new(),
        })
        .unwrap();
    let err = controller.process(&frame).unwrap_err();

    assert!(matches!(err, WireError::Handler(_)));
    assert!(room.log.lock().unwrap().is_empty());
    assert_eq!(controller.metrics().snapshot().handler_errors, 1);
}

#[test]
fn test_concurrent_dispatch() {
    let (controller, room) = controller();
    let controller = Arc::new(controller);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for j in 0..25 {
                    let frame = controller
                        .encode(&Say {
                            from: format!("t{i}"),
                            body: format!("m{j}"),
                        })
                        .unwrap();
                    assert!(controller.process(&frame).unwrap().is_some());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(room.log.lock().unwrap().len(), 200);
    assert_eq!(controller.metrics().snapshot().requests_dispatched, 200);
}

#[test]
fn test_readiness_without_services() {
    let registry = TypeRegistry::builder()
        .register::<Say>()
        .register::<Said>()
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::new();
    dispatcher.register::<SayHandler>().unwrap();

    let controller = MessageController::new(Arc::new(registry), dispatcher, CodecConfig::default());
    let err = controller.ensure_ready().unwrap_err();
    assert!(matches!(err, WireError::ConstructionUnavailable));
    assert!(err.is_fatal());
}

#[test]
fn test_set_services_after_registration() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register::<SayHandler>().unwrap();
    dispatcher.set_services(Arc::new(ServiceCollection::new().with(Room::default())));
    dispatcher.ensure_ready().unwrap();

    let reply = dispatcher
        .dispatch(Value::object(Say {
            from: "cy".into(),
            body: "hi".into(),
        }))
        .unwrap()
        .unwrap();
    assert_eq!(reply.as_object::<Said>().map(|s| s.tick), Some(1));
}

#[test]
fn test_readiness_with_missing_handler_dependency() {
    let registry = TypeRegistry::builder()
        .register::<Say>()
        .register::<Said>()
        .build()
        .unwrap();
    let mut dispatcher = Dispatcher::with_services(Arc::new(ServiceCollection::new()));
    dispatcher.register::<SayHandler>().unwrap();

    let controller = MessageController::new(Arc::new(registry), dispatcher, CodecConfig::default());
    let err = controller.ensure_ready().unwrap_err();
    assert!(matches!(err, WireError::ServiceMissing(name) if name.ends_with("Room")));
    assert!(err.is_fatal());
}
