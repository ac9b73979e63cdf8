use classbuilder::{Builder, BuilderError, Value};

fn internal_counter() -> Builder {
    let mut b = Builder::new();
    b.private_mut().insert("internalCounter", 0);
    b.public_mut().insert_method("setInternalCounter", |rx, args| {
        rx.set("internalCounter", args.first().cloned().unwrap_or_default());
        Ok(Value::Undefined)
    });
    b.public_mut().insert_method("getInternalCounter", |rx, _| Ok(rx.get("internalCounter")));
    b
}

#[test]
fn private_data_is_absent_from_the_surface() {
    let mut b = Builder::new();
    b.private_mut().insert("name", "Test123");
    let obj = b.build().instantiate(&[]).unwrap();
    assert_eq!(obj.get("name"), None);
    assert!(!obj.has("name"));
}

#[test]
fn private_methods_cannot_be_called_from_outside() {
    let mut b = Builder::new();
    b.private_mut().insert_method("getPassword", |_, _| Ok(Value::Int(1234)));
    let obj = b.build().instantiate(&[]).unwrap();
    let err = obj.call("getPassword", &[]).unwrap_err();
    assert_eq!(err, BuilderError::MemberNotFound { name: "getPassword".into() });
    assert!(obj.get("getPassword").is_none());
}

#[test]
fn private_data_cannot_be_written_from_outside() {
    let obj = internal_counter().build().instantiate(&[]).unwrap();
    let err = obj.set("internalCounter", 99).unwrap_err();
    assert_eq!(err, BuilderError::MemberNotFound { name: "internalCounter".into() });
    assert_eq!(obj.call("getInternalCounter", &[]).unwrap(), Value::Int(0));
}

#[test]
fn public_methods_read_private_data() {
    let mut b = Builder::new();
    b.private_mut().insert("name", "Test123");
    b.public_mut().insert_method("getName", |rx, _| Ok(rx.get("name")));
    let obj = b.build().instantiate(&[]).unwrap();
    assert_eq!(obj.call("getName", &[]).unwrap(), Value::from("Test123"));
}

#[test]
fn public_methods_reach_other_public_members() {
    let mut b = Builder::new();
    b.public_mut().insert("name", "Test123");
    b.public_mut().insert_method("getName", |rx, _| Ok(rx.get("name")));
    b.public_mut().insert_method("greet", |rx, _| rx.call("getName", &[]));
    let obj = b.build().instantiate(&[]).unwrap();
    assert_eq!(obj.call("greet", &[]).unwrap(), Value::from("Test123"));
}

#[test]
fn setting_a_private_value_does_not_make_it_public() {
    let obj = internal_counter().build().instantiate(&[]).unwrap();
    assert_eq!(obj.get("internalCounter"), None);
    obj.call("setInternalCounter", &[Value::Int(123)]).unwrap();
    assert_eq!(obj.get("internalCounter"), None);
    assert!(!obj.names().any(|n| n == "internalCounter"));
    assert_eq!(obj.call("getInternalCounter", &[]).unwrap(), Value::Int(123));
}

#[test]
fn names_created_by_callables_stay_internal() {
    let mut b = Builder::new();
    b.public_mut().insert_method("remember", |rx, args| {
        rx.set("memo", args.first().cloned().unwrap_or_default());
        Ok(Value::Undefined)
    });
    b.public_mut().insert_method("recall", |rx, _| Ok(rx.get("memo")));
    let obj = b.build().instantiate(&[]).unwrap();
    assert_eq!(obj.call("recall", &[]).unwrap(), Value::Undefined);
    obj.call("remember", &[Value::from("kept")]).unwrap();
    assert_eq!(obj.call("recall", &[]).unwrap(), Value::from("kept"));
    assert!(!obj.has("memo"));
    assert_eq!(obj.len(), 2);
}

#[test]
fn public_methods_are_read_only_on_the_surface() {
    let obj = internal_counter().build().instantiate(&[]).unwrap();
    let err = obj.set("getInternalCounter", 1).unwrap_err();
    assert_eq!(err, BuilderError::ReadOnly { name: "getInternalCounter".into() });
    assert!(obj.get("getInternalCounter").unwrap().is_callable());
}

#[test]
fn snapshots_and_debug_output_leave_private_state_out() {
    let mut b = internal_counter();
    b.public_mut().insert("label", "visible");
    b.private_mut().insert("password", "hunter2");
    let obj = b.build().instantiate(&[]).unwrap();
    let json = obj.to_json().unwrap();
    assert_eq!(json, serde_json::json!({ "label": "visible" }));
    let debug = format!("{:?}", obj);
    assert!(debug.contains("label"));
    assert!(!debug.contains("hunter2"));
    assert!(!debug.contains("password"));
}
