use render_cause::{diff, Name, Value, ValueSnapshot};

use support_::snapshot;

fn names(changes: &[(Name, Value)]) -> Vec<&str> {
	changes.iter().map(|(name, _)| &**name).collect()
}

#[test]
fn first_mount_reports_everything_in_order() {
	let (x, y, z) = (Value::from(5), Value::Null, Value::reference(()));
	let current = snapshot(&[("x", &x), ("y", &y), ("z", &z)]);

	let changes = diff(&current, None);

	assert_eq!(names(&changes), ["x", "y", "z"]);
	for ((_, reported), expected) in changes.iter().zip(&[x, y, z]) {
		assert!(reported.is_same(expected));
	}
}

#[test]
fn first_mount_is_not_an_empty_previous() {
	let x = Value::from(5);
	let current = snapshot(&[("x", &x)]);

	assert_eq!(format!("{:?}", diff(&current, None)), r#"[("x", 5.0)]"#);
	assert_eq!(format!("{:?}", diff(&current, Some(&ValueSnapshot::new()))), r#"[("x", 5.0)]"#);
	assert!(diff(&current, Some(&current)).is_empty());
}

#[test]
fn unchanged_snapshot_reports_nothing() {
	let values = [Value::from(1), Value::from("text"), Value::reference(vec![1, 2, 3]), Value::from(f64::NAN), Value::Undefined];
	let current = snapshot(&[("a", &values[0]), ("b", &values[1]), ("c", &values[2]), ("d", &values[3]), ("e", &values[4])]);
	let previous = current.clone();

	assert!(diff(&current, Some(&previous)).is_empty());
	assert!(diff(&current, Some(&current)).is_empty());
}

#[test]
fn changed_and_new_names() {
	let current = snapshot(&[("a", &Value::from(2)), ("b", &Value::from(3))]);
	let previous = snapshot(&[("a", &Value::from(1))]);

	assert_eq!(format!("{:?}", diff(&current, Some(&previous))), r#"[("a", 2.0), ("b", 3.0)]"#);
}

#[test]
fn new_name_is_reported_regardless_of_value() {
	let shared = Value::reference("shared");
	let current = snapshot(&[("old", &shared), ("new", &shared)]);
	let previous = snapshot(&[("old", &shared)]);

	assert_eq!(names(&diff(&current, Some(&previous))), ["new"]);
}

#[test]
fn equal_contents_in_new_allocation_are_a_change() {
	let current = snapshot(&[("style", &Value::reference(vec!["bold"])), ("onClick", &Value::reference("closure"))]);
	let previous = snapshot(&[("style", &Value::reference(vec!["bold"])), ("onClick", &Value::reference("closure"))]);

	assert_eq!(names(&diff(&current, Some(&previous))), ["style", "onClick"]);
}

#[test]
fn primitives_compare_by_value() {
	let current = snapshot(&[("s", &Value::from(String::from("label"))), ("n", &Value::from(f64::NAN)), ("b", &Value::from(true))]);
	let previous = snapshot(&[("s", &Value::from("label")), ("n", &Value::from(f64::NAN)), ("b", &Value::from(true))]);
	assert!(diff(&current, Some(&previous)).is_empty());

	let current = snapshot(&[("zero", &Value::from(-0.0)), ("null", &Value::Null)]);
	let previous = snapshot(&[("zero", &Value::from(0.0)), ("null", &Value::Undefined)]);
	assert_eq!(names(&diff(&current, Some(&previous))), ["zero", "null"]);
}

#[test]
fn removed_names_are_not_reported() {
	let kept = Value::from(1);
	let current = snapshot(&[("kept", &kept)]);
	let previous = snapshot(&[("kept", &kept), ("removed", &Value::from(2))]);

	assert!(diff(&current, Some(&previous)).is_empty());
}

#[test]
fn output_follows_current_order_not_previous() {
	let (a, b, c) = (Value::from(1), Value::from(2), Value::from(3));
	let current = snapshot(&[("c", &c), ("a", &a), ("b", &b)]);
	let previous = snapshot(&[("a", &Value::from(0)), ("b", &Value::from(0)), ("c", &Value::from(0))]);

	assert_eq!(names(&diff(&current, Some(&previous))), ["c", "a", "b"]);
}

#[test]
fn reassignment_keeps_position() {
	let mut current = ValueSnapshot::new();
	current.insert("a", 1);
	current.insert("b", 2);
	assert!(current.insert("a", 3).is_some());

	assert_eq!(format!("{:?}", diff(&current, None)), r#"[("a", 3.0), ("b", 2.0)]"#);
}

#[test]
fn repeated_diffs_are_identical() {
	let current = snapshot(&[("items", &Value::reference(vec![1, 2])), ("count", &Value::from(2)), ("title", &Value::from("list"))]);
	let previous = snapshot(&[("count", &Value::from(1))]);

	let first = format!("{:?}", diff(&current, Some(&previous)));
	for _ in 0..10 {
		assert_eq!(format!("{:?}", diff(&current, Some(&previous))), first);
	}
	assert_eq!(first, r#"[("items", [1, 2]), ("count", 2.0), ("title", "list")]"#);
}
