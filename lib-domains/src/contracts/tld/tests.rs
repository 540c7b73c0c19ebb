use super::*;
use crate::contracts::metadata::PlainMetadata;
use crate::types::milli_ether;

const OWNER: u64 = 1;
const FACTORY_OWNER: u64 = 2;
const ALICE: u64 = 10;
const BOB: u64 = 11;
const CAROL: u64 = 12;

fn addr(id: u64) -> Address {
    Address::from_low_u64(id)
}

fn ctx(caller: u64) -> ExecutionContext {
    ExecutionContext::new(addr(caller), 1, 1_000)
}

fn paying(caller: u64, value: Wei) -> ExecutionContext {
    ctx(caller).with_value(value)
}

fn registry(buying_enabled: bool) -> TldRegistry {
    TldRegistry::new(TldRegistryParams {
        name: ".web3".to_string(),
        symbol: "WEB3".to_string(),
        owner: addr(OWNER),
        price: milli_ether(100),
        buying_enabled,
        royalty_bps: 250,
        factory_address: addr(99),
        royalty_fee_updater: addr(FACTORY_OWNER),
        metadata_address: addr(98),
        name_max_length: 140,
        first_token_id: 1,
    })
}

fn mint(reg: &mut TldRegistry, name: &str, holder: u64) -> TokenId {
    reg.mint(&mut ctx(OWNER), name, addr(holder), Address::ZERO).unwrap()
}

#[test]
fn test_mint_round_trip() {
    let mut reg = registry(true);
    let mut buyer = paying(ALICE, milli_ether(100));

    let id = reg.mint(&mut buyer, "alice", addr(ALICE), addr(BOB)).unwrap();

    assert_eq!(id, 1);
    assert_eq!(reg.get_domain_holder("alice"), addr(ALICE));
    assert_eq!(reg.domain_ids_names(id), "alice");
    assert_eq!(reg.owner_of(id).unwrap(), addr(ALICE));
    assert_eq!(reg.balance_of(&addr(ALICE)), 1);
    assert_eq!(reg.total_supply(), 1);
    assert_eq!(reg.collected(), milli_ether(100));

    let created = buyer
        .events()
        .iter()
        .find(|record| record.event.event_type() == "DomainCreated")
        .unwrap();
    match &created.event {
        DomainEvent::DomainCreated { full_name, referrer, .. } => {
            assert_eq!(full_name, "alice.web3");
            assert_eq!(*referrer, addr(BOB));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_token_ids_are_sequential() {
    let mut reg = registry(false);
    assert_eq!(mint(&mut reg, "one", ALICE), 1);
    assert_eq!(mint(&mut reg, "two", ALICE), 2);
    assert_eq!(mint(&mut reg, "three", BOB), 3);
}

#[test]
fn test_unminted_reads_are_sentinels() {
    let reg = registry(true);
    assert_eq!(reg.get_domain_holder("nobody"), Address::ZERO);
    assert_eq!(reg.domain_ids_names(5), "");
    assert_eq!(reg.default_names(&addr(ALICE)), "");
    assert_eq!(reg.owner_of(5), Err(ContractError::InvalidTokenId(5)));
}

#[test]
fn test_public_mint_requires_buying_and_payment() {
    let mut closed = registry(false);
    assert_eq!(
        closed.mint(&mut paying(ALICE, milli_ether(100)), "alice", addr(ALICE), Address::ZERO),
        Err(ContractError::BuyingDomainsDisabled)
    );

    let mut open = registry(true);
    assert_eq!(
        open.mint(&mut paying(ALICE, milli_ether(99)), "alice", addr(ALICE), Address::ZERO),
        Err(ContractError::ValueBelowPrice {
            price: milli_ether(100),
            paid: milli_ether(99)
        })
    );
}

#[test]
fn test_owner_and_minter_bypass_buying_flag() {
    let mut reg = registry(false);
    mint(&mut reg, "owned", ALICE);

    reg.change_minter(&mut ctx(OWNER), addr(CAROL)).unwrap();
    reg.mint(&mut ctx(CAROL), "minted", addr(BOB), Address::ZERO).unwrap();
    assert_eq!(reg.get_domain_holder("minted"), addr(BOB));
}

#[test]
fn test_domain_name_rules() {
    let mut reg = registry(false);
    let mut owner = ctx(OWNER);

    assert_eq!(
        reg.mint(&mut owner, "", addr(ALICE), Address::ZERO),
        Err(ContractError::DomainNameEmpty)
    );
    assert_eq!(
        reg.mint(&mut owner, "a.b", addr(ALICE), Address::ZERO),
        Err(ContractError::DomainNameHasDot)
    );
    assert_eq!(
        reg.mint(&mut owner, "a b", addr(ALICE), Address::ZERO),
        Err(ContractError::DomainNameHasSpace)
    );
    assert_eq!(
        reg.mint(&mut owner, &"x".repeat(140), addr(ALICE), Address::ZERO),
        Err(ContractError::DomainNameTooLong { max: 140, actual: 140 })
    );
    assert_eq!(
        reg.mint(&mut owner, "alice", Address::ZERO, Address::ZERO),
        Err(ContractError::MintToZeroAddress)
    );
}

#[test]
fn test_names_are_lowercased_and_unique() {
    let mut reg = registry(false);
    mint(&mut reg, "Alice", ALICE);

    assert_eq!(reg.domain_ids_names(1), "alice");
    assert_eq!(reg.get_domain_holder("ALICE"), addr(ALICE));
    assert_eq!(
        reg.mint(&mut ctx(OWNER), "alice", addr(BOB), Address::ZERO),
        Err(ContractError::DomainAlreadyExists {
            name: "alice".to_string()
        })
    );
}

#[test]
fn test_first_mint_sets_default() {
    let mut reg = registry(false);
    mint(&mut reg, "first", ALICE);
    mint(&mut reg, "second", ALICE);

    assert_eq!(reg.default_names(&addr(ALICE)), "first");
}

#[test]
fn test_edit_default_domain_requires_holder() {
    let mut reg = registry(false);
    mint(&mut reg, "first", ALICE);
    mint(&mut reg, "second", ALICE);

    reg.edit_default_domain(&mut ctx(ALICE), "second").unwrap();
    assert_eq!(reg.default_names(&addr(ALICE)), "second");

    assert_eq!(
        reg.edit_default_domain(&mut ctx(BOB), "first"),
        Err(ContractError::NotDomainHolder {
            name: "first".to_string()
        })
    );
    assert_eq!(
        reg.edit_default_domain(&mut ctx(ALICE), "missing"),
        Err(ContractError::NotDomainHolder {
            name: "missing".to_string()
        })
    );
}

#[test]
fn test_transfer_moves_holder_and_defaults() {
    let mut reg = registry(false);
    let id = mint(&mut reg, "alice", ALICE);
    mint(&mut reg, "spare", ALICE);
    assert_eq!(reg.default_names(&addr(ALICE)), "alice");
    reg.edit_data(&mut ctx(ALICE), "alice", "{\"twitter\":\"@alice\"}").unwrap();

    reg.transfer_from(&mut ctx(ALICE), addr(ALICE), addr(BOB), id).unwrap();

    assert_eq!(reg.domain_data("alice"), "");

    assert_eq!(reg.get_domain_holder("alice"), addr(BOB));
    assert_eq!(reg.owner_of(id).unwrap(), addr(BOB));
    assert_eq!(reg.balance_of(&addr(ALICE)), 1);
    assert_eq!(reg.balance_of(&addr(BOB)), 1);
    assert_eq!(reg.default_names(&addr(ALICE)), "");
    assert_eq!(reg.default_names(&addr(BOB)), "alice");
}

#[test]
fn test_transfer_keeps_recipient_default() {
    let mut reg = registry(false);
    let id = mint(&mut reg, "alice", ALICE);
    mint(&mut reg, "bob", BOB);

    reg.transfer_from(&mut ctx(ALICE), addr(ALICE), addr(BOB), id).unwrap();
    assert_eq!(reg.default_names(&addr(BOB)), "bob");
}

#[test]
fn test_transfer_authorization() {
    let mut reg = registry(false);
    let id = mint(&mut reg, "alice", ALICE);

    assert_eq!(
        reg.transfer_from(&mut ctx(BOB), addr(ALICE), addr(BOB), id),
        Err(ContractError::NotOwnerNorApproved)
    );
    assert_eq!(
        reg.transfer_from(&mut ctx(ALICE), addr(BOB), addr(CAROL), id),
        Err(ContractError::TransferFromIncorrectOwner)
    );
    assert_eq!(
        reg.transfer_from(&mut ctx(ALICE), addr(ALICE), Address::ZERO, id),
        Err(ContractError::TransferToZeroAddress)
    );
    assert_eq!(
        reg.transfer_from(&mut ctx(ALICE), addr(ALICE), addr(BOB), 42),
        Err(ContractError::InvalidTokenId(42))
    );

    reg.approve(&mut ctx(ALICE), addr(BOB), id).unwrap();
    assert_eq!(reg.get_approved(id).unwrap(), addr(BOB));
    reg.transfer_from(&mut ctx(BOB), addr(ALICE), addr(CAROL), id).unwrap();

    // approval does not survive the transfer
    assert_eq!(reg.get_approved(id).unwrap(), Address::ZERO);
    assert_eq!(reg.get_domain_holder("alice"), addr(CAROL));
}

#[test]
fn test_operator_approval() {
    let mut reg = registry(false);
    let id = mint(&mut reg, "alice", ALICE);

    assert_eq!(
        reg.set_approval_for_all(&mut ctx(ALICE), addr(ALICE), true),
        Err(ContractError::ApproveToCaller)
    );
    assert_eq!(
        reg.approve(&mut ctx(ALICE), addr(ALICE), id),
        Err(ContractError::ApprovalToCurrentOwner)
    );

    reg.set_approval_for_all(&mut ctx(ALICE), addr(CAROL), true).unwrap();
    assert!(reg.is_approved_for_all(&addr(ALICE), &addr(CAROL)));

    // an operator may approve on the owner's behalf
    reg.approve(&mut ctx(CAROL), addr(BOB), id).unwrap();
    reg.transfer_from(&mut ctx(CAROL), addr(ALICE), addr(BOB), id).unwrap();
    assert_eq!(reg.owner_of(id).unwrap(), addr(BOB));
}

#[test]
fn test_burn() {
    let mut reg = registry(false);
    let id = mint(&mut reg, "alice", ALICE);

    assert_eq!(
        reg.burn(&mut ctx(BOB), "alice"),
        Err(ContractError::NotDomainHolder {
            name: "alice".to_string()
        })
    );

    reg.burn(&mut ctx(ALICE), "alice").unwrap();
    assert_eq!(reg.get_domain_holder("alice"), Address::ZERO);
    assert_eq!(reg.domain_ids_names(id), "");
    assert_eq!(reg.default_names(&addr(ALICE)), "");
    assert_eq!(reg.total_supply(), 0);
    assert_eq!(reg.balance_of(&addr(ALICE)), 0);

    // ids are never reused
    assert_eq!(mint(&mut reg, "alice", BOB), 2);
}

#[test]
fn test_edit_data() {
    let mut reg = registry(false);
    mint(&mut reg, "alice", ALICE);

    reg.edit_data(&mut ctx(ALICE), "alice", "{\"url\":\"x\"}").unwrap();
    assert_eq!(reg.get_domain("alice").unwrap().data, "{\"url\":\"x\"}");
    assert!(reg.edit_data(&mut ctx(BOB), "alice", "").is_err());
}

#[test]
fn test_owner_administration() {
    let mut reg = registry(false);

    assert_eq!(reg.change_price(&mut ctx(ALICE), 1), Err(ContractError::NotOwner));
    reg.change_price(&mut ctx(OWNER), 1).unwrap();
    assert_eq!(reg.price(), 1);

    reg.toggle_buying_domains(&mut ctx(OWNER)).unwrap();
    assert!(reg.buying_enabled());

    reg.change_name_max_length(&mut ctx(OWNER), 4).unwrap();
    assert_eq!(
        reg.mint(&mut ctx(OWNER), "four", addr(ALICE), Address::ZERO),
        Err(ContractError::DomainNameTooLong { max: 4, actual: 4 })
    );

    reg.change_metadata_address(&mut ctx(OWNER), addr(97)).unwrap();
    reg.freeze_metadata(&mut ctx(OWNER)).unwrap();
    assert_eq!(
        reg.change_metadata_address(&mut ctx(OWNER), addr(96)),
        Err(ContractError::MetadataFrozen)
    );
    assert_eq!(reg.metadata_address(), addr(97));
}

#[test]
fn test_royalty() {
    let mut reg = registry(false);
    assert_eq!(reg.royalty_info(10_000), (addr(FACTORY_OWNER), 250));

    assert_eq!(reg.change_royalty(&mut ctx(OWNER), 100), Err(ContractError::NotRoyaltyFeeUpdater));
    assert_eq!(
        reg.change_royalty(&mut ctx(FACTORY_OWNER), 5_001),
        Err(ContractError::RoyaltyTooHigh { bps: 5_001 })
    );
    reg.change_royalty(&mut ctx(FACTORY_OWNER), 1_000).unwrap();
    reg.change_royalty_fee_receiver(&mut ctx(FACTORY_OWNER), addr(CAROL)).unwrap();
    assert_eq!(reg.royalty_info(10_000), (addr(CAROL), 1_000));
}

#[test]
fn test_token_uri_uses_full_name() {
    let mut reg = registry(false);
    let id = mint(&mut reg, "alice", ALICE);

    let uri = reg.token_uri(id, &PlainMetadata::new()).unwrap();
    assert!(uri.starts_with("data:application/json;base64,"));
    assert_eq!(reg.token_uri(7, &PlainMetadata::new()), Err(ContractError::InvalidTokenId(7)));
}
