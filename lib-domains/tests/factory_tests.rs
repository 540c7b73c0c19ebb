//! TLD creation through the chain

mod common;

use common::*;
use lib_domains::contracts::EventIndexer;
use lib_domains::types::{ether, milli_ether};
use lib_domains::{ContractError, DomainEvent, TldParams};

fn web3_params() -> TldParams {
    TldParams::new(".web3", "WEB3", owner(), milli_ether(200), false)
}

#[test]
fn test_web3_scenario() {
    let mut d = Deployment::new();

    let err = d
        .chain
        .create_tld(alice(), d.factory, milli_ether(900), web3_params())
        .unwrap_err();
    assert_eq!(err.to_string(), "Value below price");

    let tld = d.chain.create_tld(alice(), d.factory, ether(1), web3_params()).unwrap();
    assert_eq!(d.chain.factory(&d.factory).unwrap().tld_names_addresses(".web3"), tld);

    let created = d.chain.events().get_events_by_type("TldCreated");
    assert_eq!(created.len(), 1);
    match &created[0].event {
        DomainEvent::TldCreated { tld_address, name, .. } => {
            assert_eq!(*tld_address, tld);
            assert_eq!(name, ".web3");
        }
        other => panic!("unexpected event {:?}", other),
    }

    let err = d
        .chain
        .create_tld(alice(), d.factory, ether(1), web3_params())
        .unwrap_err();
    assert_eq!(err.to_string(), "TLD already exists");
}

#[test]
fn test_created_tld_contract() {
    let mut d = Deployment::new();
    let tld = d.chain.create_tld(alice(), d.factory, ether(1), web3_params()).unwrap();

    let registry = d.chain.tld(&tld).unwrap();
    assert_eq!(registry.name(), ".web3");
    assert_eq!(registry.symbol(), "WEB3");
    assert_eq!(registry.owner(), owner());
    assert_eq!(registry.price(), milli_ether(200));
    assert!(!registry.buying_enabled());
    assert_eq!(registry.factory_address(), d.factory);
    assert_eq!(registry.metadata_address(), d.metadata);
    assert_eq!(d.chain.factory(&d.factory).unwrap().collected(), ether(1));
}

#[test]
fn test_every_format_error_has_its_reason() {
    let mut d = Deployment::new();
    let too_long = format!(".{}", "a".repeat(40));
    let cases = [
        ("", "TLD too short"),
        (".", "TLD too short"),
        ("web3", "Name must have 1 dot"),
        (".we.b3", "Name must have 1 dot"),
        ("web.3", "Name must start with dot"),
        (too_long.as_str(), "TLD too long"),
        (".com", "Forbidden TLD"),
        (".eth", "Forbidden TLD"),
    ];

    for (name, reason) in cases {
        let params = TldParams::new(name, "X", owner(), 0, false);
        let err = d.chain.create_tld(alice(), d.factory, ether(1), params).unwrap_err();
        assert_eq!(err.to_string(), reason, "name {:?}", name);
    }
    assert!(d.chain.factory(&d.factory).unwrap().tlds().is_empty());
}

#[test]
fn test_buying_disabled_then_owner_bypass() {
    let mut d = Deployment::new();
    d.chain.toggle_buying_tlds(owner(), d.factory).unwrap();

    assert_eq!(
        d.chain.create_tld(alice(), d.factory, ether(1), web3_params()),
        Err(ContractError::BuyingTldsDisabled)
    );
    assert_eq!(
        d.chain.owner_create_tld(alice(), d.factory, web3_params()),
        Err(ContractError::NotOwner)
    );
    d.chain.owner_create_tld(owner(), d.factory, web3_params()).unwrap();

    let own = TldParams::new(".own", "OWN", owner(), 0, true);
    let tld = d.chain.create_tld(owner(), d.factory, 0, own).unwrap();
    assert_eq!(d.resolver().get_tld_address(".own"), tld);
}

#[test]
fn test_names_unique_across_factories() {
    let mut d = Deployment::new();
    let second = d.add_factory();

    d.tld(".web3");
    assert_eq!(
        d.chain.owner_create_tld(owner(), second, web3_params()),
        Err(ContractError::TldForbidden {
            name: ".web3".to_string()
        })
    );
    assert!(d.chain.forbidden(&d.forbidden).unwrap().is_forbidden(".web3"));
}

#[test]
fn test_factory_grants_are_audited() {
    let mut d = Deployment::new();
    let second = d.add_factory();

    let registry = d.chain.forbidden(&d.forbidden).unwrap();
    let grants = registry.grants();
    assert_eq!(grants.len(), 2);
    assert_eq!(grants[1].factory, second);
    assert_eq!(grants[1].granted_by, owner());

    // factories cannot widen the allowlist unless the owner opts in
    assert_eq!(
        d.chain.transact(d.factory, 0, |state, _, ctx| {
            ctx.enter(d.forbidden);
            state
                .contracts
                .forbidden
                .get_mut(&d.forbidden)
                .unwrap()
                .add_factory_address(ctx, addr(777))
        }),
        Err(ContractError::NotFactoryGranter)
    );
    d.chain.set_transitive_grants(owner(), d.forbidden, true).unwrap();
    d.chain.forbidden_add_factory(d.factory, d.forbidden, addr(777)).unwrap();
    assert!(d.chain.forbidden(&d.forbidden).unwrap().is_factory(&addr(777)));
}

#[test]
fn test_price_changes_apply() {
    let mut d = Deployment::new();
    d.chain.change_factory_price(owner(), d.factory, milli_ether(10)).unwrap();

    d.chain
        .create_tld(alice(), d.factory, milli_ether(10), web3_params())
        .unwrap();
    assert_eq!(
        d.chain.change_factory_price(alice(), d.factory, 0),
        Err(ContractError::NotOwner)
    );
}
