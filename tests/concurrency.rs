use std::sync::{Arc, Mutex};
use std::thread;

use classbuilder::{Builder, Factory, Instance, Value};

fn assert_send_sync<T: Send + Sync>() {}

fn counter() -> Factory {
    let mut b = Builder::new();
    b.private_mut().insert("counter", 0);
    b.public_mut().insert_method("increment", |rx, _| {
        let n = rx.get("counter").expect_int()?;
        rx.set("counter", n + 1);
        Ok(Value::Undefined)
    });
    b.public_mut().insert_method("getCounter", |rx, _| Ok(rx.get("counter")));
    b.build()
}

// Panics when the last handle to the callable holding it goes away.
struct Fuse;
impl Drop for Fuse {
    fn drop(&mut self) {
        if !thread::panicking() {
            panic!("fuse dropped");
        }
    }
}

#[test]
fn handles_are_send_and_sync() {
    assert_send_sync::<Instance>();
    assert_send_sync::<Factory>();
    assert_send_sync::<Builder>();
    assert_send_sync::<Value>();
}

#[test]
fn public_methods_run_on_other_threads() {
    let obj = counter().instantiate(&[]).unwrap();
    let remote = obj.clone();
    thread::spawn(move || {
        for _ in 0..3 {
            remote.call("increment", &[]).expect("increment");
        }
    })
    .join()
    .expect("worker thread");
    assert_eq!(obj.call("getCounter", &[]).unwrap(), Value::Int(3));
}

#[test]
fn factories_instantiate_from_many_threads() {
    let factory = counter();
    let workers: Vec<_> = (0..4)
        .map(|n| {
            let factory = factory.clone();
            thread::spawn(move || {
                let obj = factory.instantiate(&[]).expect("instance");
                for _ in 0..n {
                    obj.call("increment", &[]).expect("increment");
                }
                obj
            })
        })
        .collect();
    for (n, worker) in workers.into_iter().enumerate() {
        let obj = worker.join().expect("worker thread");
        assert!(factory.is_instance(&obj));
        assert_eq!(obj.call("getCounter", &[]).unwrap(), Value::Int(n as i64));
    }
}

#[test]
fn shared_instance_counts_every_call() {
    let obj = counter().instantiate(&[]).unwrap();
    // read-then-write is not atomic across calls, so serialize the workers
    let gate = Arc::new(Mutex::new(()));
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let obj = obj.clone();
            let gate = gate.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    let _turn = gate.lock().unwrap();
                    obj.call("increment", &[]).expect("increment");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker thread");
    }
    assert_eq!(obj.call("getCounter", &[]).unwrap(), Value::Int(100));
}

#[test]
fn instance_answers_after_a_thread_panics_holding_its_lock() {
    let mut b = Builder::new();
    b.private_mut().insert("counter", 0);
    b.private_mut().insert("fuse", Value::Null);
    b.public_mut().insert_method("arm", |rx, _| {
        let fuse = Fuse;
        rx.set(
            "fuse",
            Value::function(move |_, _| {
                let _held = &fuse;
                Ok(Value::Null)
            }),
        );
        Ok(Value::Undefined)
    });
    // overwriting the slot drops the fuse while the slot lock is held
    b.public_mut().insert_method("disarm", |rx, _| {
        rx.set("counter", 7);
        rx.set("fuse", Value::Null);
        Ok(Value::Undefined)
    });
    b.public_mut().insert_method("getCounter", |rx, _| Ok(rx.get("counter")));
    b.public_mut().insert_method("getFuse", |rx, _| Ok(rx.get("fuse")));
    let obj = b.build().instantiate(&[]).unwrap();

    obj.call("arm", &[]).unwrap();
    assert!(obj.call("getFuse", &[]).unwrap().is_callable());
    let remote = obj.clone();
    let outcome = thread::spawn(move || remote.call("disarm", &[])).join();
    assert!(outcome.is_err(), "the worker should have panicked");

    assert_eq!(obj.call("getCounter", &[]).unwrap(), Value::Int(7));
    assert_eq!(obj.call("getFuse", &[]).unwrap(), Value::Null);
    obj.call("arm", &[]).unwrap();
    assert!(obj.call("getFuse", &[]).unwrap().is_callable());
    // keep the second fuse alive past the end of the test
    std::mem::forget(obj.call("getFuse", &[]).unwrap());
}
