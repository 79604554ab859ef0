use super::*;
use std::collections::BTreeMap;

#[test]
fn get_or_create_returns_same_store() {
    let reg = KvStoresRegistry::new();
    let a = reg.get_or_create("symbols");
    a.put("AAA", KvValue::from("x")).unwrap();
    let b = reg.get_or_create("symbols");
    assert_eq!(b.get("AAA").unwrap(), Some(KvValue::from("x")));
    assert_eq!(reg.list_stores(), vec!["symbols".to_string()]);
}

#[test]
fn put_if_absent_keeps_first_value() {
    let reg = KvStoresRegistry::new();
    let c = reg.get_or_create("m");
    assert_eq!(c.put_if_absent("k", KvValue::Int(1)).unwrap(), None);
    assert_eq!(c.put_if_absent("k", KvValue::Int(2)).unwrap(), Some(KvValue::Int(1)));
    assert_eq!(c.get("k").unwrap(), Some(KvValue::Int(1)));
    assert_eq!(reg.get_store("m").write_count(), 1);
}

#[test]
fn put_all_is_one_write() {
    let reg = KvStoresRegistry::new();
    let c = reg.get_or_create("m");
    let mut entries = BTreeMap::new();
    entries.insert("a".to_string(), KvValue::from("1"));
    entries.insert("b".to_string(), KvValue::from("2"));
    c.put_all(entries).unwrap();
    assert_eq!(c.size().unwrap(), 2);
    assert_eq!(c.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(reg.get_store("m").write_count(), 1);
}

#[test]
fn destroy_unlinks_and_next_access_is_fresh() {
    let reg = KvStoresRegistry::new();
    let c = reg.get_or_create("m");
    c.put("a", KvValue::Int(1)).unwrap();
    c.destroy().unwrap();
    assert!(!reg.contains_store("m"));
    let again = reg.get_or_create("m");
    assert!(again.is_empty().unwrap());
}

#[test]
fn objects_report_kinds() {
    let reg = KvStoresRegistry::new();
    reg.get_or_create("b_map");
    reg.get_or_create("a_map");
    reg.register_object("trades-topic", "topic");
    let objs = reg.objects().unwrap();
    assert_eq!(objs.len(), 3);
    assert_eq!(objs[0], ObjectInfo { name: "a_map".into(), kind: ObjectKind::Map });
    assert_eq!(objs[2].kind.label(), "topic");
    assert!(reg.destroy_object("trades-topic").unwrap());
    assert!(!reg.destroy_object("trades-topic").unwrap());
}
