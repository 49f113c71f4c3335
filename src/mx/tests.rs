use super::{Error, MxRecord, MxStatus, resolver};

type LookupResult = Result<Vec<MxRecord>, Error>;
type LookupFn = dyn Fn(&str) -> LookupResult + Send + Sync;

pub(crate) struct StubResolver {
    pub on_lookup: Box<LookupFn>,
}

impl StubResolver {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> LookupResult + Send + Sync + 'static,
    {
        Self {
            on_lookup: Box::new(f),
        }
    }
}

#[test]
fn normalize_domain_rejects_empty() {
    let err = resolver::normalize_domain("").expect_err("empty domain should fail");
    assert!(matches!(err, Error::EmptyDomain));
}

#[test]
fn normalize_domain_handles_unicode_and_trailing_dot() {
    let ascii = resolver::normalize_domain(" bücher.example. ").expect("idna");
    assert_eq!(ascii, "xn--bcher-kva.example");
}

#[test]
fn resolve_with_sorts_and_dedups_records() {
    let stub = StubResolver::new(|domain| {
        assert_eq!(domain, "example.com");
        Ok(vec![
            MxRecord::new(20, "mx2.example.com"),
            MxRecord::new(10, "mx1.example.com"),
            MxRecord::new(10, "mx1.example.com"),
            MxRecord::new(30, "mx3.example.com"),
        ])
    });

    let status = resolver::resolve_with(&stub, "example.com").expect("lookup succeeds");
    let records = match status {
        MxStatus::Records(records) => records,
        MxStatus::NoRecords => panic!("expected records"),
    };
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].preference, 10);
    assert_eq!(records[0].exchange, "mx1.example.com");
    assert_eq!(records[2].preference, 30);
}

#[test]
fn resolve_with_handles_no_records() {
    let stub = StubResolver::new(|domain| {
        assert_eq!(domain, "example.com");
        Ok(Vec::new())
    });

    let status = resolver::resolve_with(&stub, "example.com").expect("lookup succeeds");
    assert!(matches!(status, MxStatus::NoRecords));
}

#[test]
fn resolve_with_propagates_missing_domain() {
    let stub = StubResolver::new(|domain| Err(Error::no_such_host(domain)));

    let err = resolver::resolve_with(&stub, "nope.invalid").expect_err("missing domain");
    assert!(matches!(err, Error::NoSuchHost { .. }));
    assert!(err.to_string().contains("no such host"));
}

#[test]
fn closures_act_as_resolvers() {
    let lookup = |_: &str| -> LookupResult { Ok(vec![MxRecord::new(5, "mx.example.org")]) };
    let status = resolver::resolve_with(&lookup, "example.org").expect("lookup succeeds");
    assert_eq!(status.records(), &[MxRecord::new(5, "mx.example.org")]);
}

#[test]
fn normalize_exchange_trims_dot_and_lowercases() {
    let out = resolver::normalize_exchange("Mail.EXAMPLE.com.".to_string());
    assert_eq!(out, "mail.example.com");
}

#[test]
fn socket_addr_appends_port() {
    assert_eq!(
        MxRecord::new(0, "mx.example.com").socket_addr(25),
        "mx.example.com:25"
    );
}
