use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pawfund_core::allocations::{
    AllocationError, AllocationRequest, AllocationService, AllocationStatus,
};
use pawfund_core::audit::AuditLogRepository;
use pawfund_core::beneficiaries::{BeneficiaryService, NewBeneficiary};
use pawfund_core::donations::{DonationRequest, DonationService};
use pawfund_core::Error;

mod common;

struct Fixture {
    allocations: AllocationService,
    audit: AuditLogRepository,
    beneficiary_id: String,
    donation_id: String,
}

/// Registers a beneficiary with a 200 goal, fully funds it with one
/// donation, then archives it so allocations become permitted.
async fn funded_and_archived(pool: &Arc<pawfund_core::db::DbPool>) -> Fixture {
    let beneficiaries = BeneficiaryService::new(pool.clone());
    let donations = DonationService::new(pool.clone(), Arc::new(common::StubGateway::new()));

    let beneficiary = beneficiaries
        .register_beneficiary(NewBeneficiary {
            id: None,
            name: "Hazel".to_string(),
            funding_goal: dec!(200),
        })
        .unwrap();

    let receipt = donations
        .process_donation(DonationRequest {
            donor_id: Some("donor-1".to_string()),
            beneficiary_id: beneficiary.id.clone(),
            requested_amount: dec!(200),
            donor_name: "Jamie Donor".to_string(),
            donor_email: "jamie@example.com".to_string(),
        })
        .await
        .unwrap();

    beneficiaries.archive_beneficiary(&beneficiary.id).unwrap();

    Fixture {
        allocations: AllocationService::new(pool.clone()),
        audit: AuditLogRepository::new(pool.clone()),
        beneficiary_id: beneficiary.id,
        donation_id: receipt.donation_id,
    }
}

fn request(fixture: &Fixture, amount: Decimal, attributed: bool) -> AllocationRequest {
    AllocationRequest {
        donation_transaction_id: attributed.then(|| fixture.donation_id.clone()),
        beneficiary_id: fixture.beneficiary_id.clone(),
        category: "Medical".to_string(),
        amount,
        donation_covered_amount: if attributed { amount } else { Decimal::ZERO },
        external_covered_amount: if attributed { Decimal::ZERO } else { amount },
        external_funding_source: (!attributed).then(|| "City grant".to_string()),
        description: None,
        status: AllocationStatus::Draft,
        allocation_date: None,
    }
}

#[tokio::test]
async fn allocations_never_exceed_the_donation_they_draw_from() {
    let (pool, _dir) = common::setup_pool();
    let fixture = funded_and_archived(&pool).await;

    // The full accepted amount fits exactly
    let created = fixture
        .allocations
        .create_allocation("admin-1", request(&fixture, dec!(200), true))
        .unwrap();
    assert_eq!(created.amount, dec!(200));

    // One more cent against the same donation is over the cap
    let err = fixture
        .allocations
        .create_allocation("admin-1", request(&fixture, dec!(0.01), true))
        .unwrap_err();

    match err {
        Error::Allocation(AllocationError::ExceedsRemaining { remaining }) => {
            assert_eq!(remaining, dec!(0));
        }
        other => panic!("expected ExceedsRemaining, got {other:?}"),
    }
}

#[tokio::test]
async fn allocation_requires_an_archived_beneficiary() {
    let (pool, _dir) = common::setup_pool();
    let beneficiaries = BeneficiaryService::new(pool.clone());
    let allocations = AllocationService::new(pool.clone());

    let beneficiary = beneficiaries
        .register_beneficiary(NewBeneficiary {
            id: None,
            name: "Rusty".to_string(),
            funding_goal: dec!(100),
        })
        .unwrap();

    let err = allocations
        .create_allocation(
            "admin-1",
            AllocationRequest {
                donation_transaction_id: None,
                beneficiary_id: beneficiary.id.clone(),
                category: "Food".to_string(),
                amount: dec!(10),
                donation_covered_amount: Decimal::ZERO,
                external_covered_amount: dec!(10),
                external_funding_source: Some("City grant".to_string()),
                description: None,
                status: AllocationStatus::Draft,
                allocation_date: None,
            },
        )
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Allocation(AllocationError::BeneficiaryNotArchived(_))
    ));
}

#[tokio::test]
async fn unattributed_allocation_skips_the_donation_cap() {
    let (pool, _dir) = common::setup_pool();
    let fixture = funded_and_archived(&pool).await;

    // Externally funded spend can exceed anything a single donation covers
    let created = fixture
        .allocations
        .create_allocation("admin-1", request(&fixture, dec!(1000), false))
        .unwrap();

    assert_eq!(created.amount, dec!(1000));
    assert!(created.donation_transaction_id.is_none());
}

#[tokio::test]
async fn update_revalidates_excluding_its_own_prior_amount() {
    let (pool, _dir) = common::setup_pool();
    let fixture = funded_and_archived(&pool).await;

    let created = fixture
        .allocations
        .create_allocation("admin-1", request(&fixture, dec!(150), true))
        .unwrap();

    // Growing to the full 200 is fine: the record's own 150 does not count
    // against itself.
    let grown = fixture
        .allocations
        .update_allocation("admin-1", &created.id, request(&fixture, dec!(200), true))
        .unwrap();
    assert_eq!(grown.amount, dec!(200));

    // But 201 is over the cap
    let err = fixture
        .allocations
        .update_allocation("admin-1", &created.id, request(&fixture, dec!(201), true))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Allocation(AllocationError::ExceedsRemaining { .. })
    ));
}

#[tokio::test]
async fn allocation_changes_are_audited() {
    let (pool, _dir) = common::setup_pool();
    let fixture = funded_and_archived(&pool).await;

    let created = fixture
        .allocations
        .create_allocation("admin-1", request(&fixture, dec!(50), true))
        .unwrap();
    fixture
        .allocations
        .update_allocation("admin-1", &created.id, request(&fixture, dec!(60), true))
        .unwrap();
    fixture
        .allocations
        .delete_allocation("admin-1", &created.id)
        .unwrap();

    let trail = fixture
        .audit
        .entries_for_entity("fund_allocation", &created.id)
        .unwrap();

    let mut actions: Vec<&str> = trail.iter().map(|e| e.action_type.as_str()).collect();
    actions.sort_unstable();
    assert_eq!(
        actions,
        vec!["CREATE_ALLOCATION", "DELETE_ALLOCATION", "UPDATE_ALLOCATION"]
    );
    assert!(trail.iter().all(|e| e.actor_id == "admin-1"));
}

#[tokio::test]
async fn beneficiary_summary_separates_allocation_and_fundraising_gaps() {
    let (pool, _dir) = common::setup_pool();
    let fixture = funded_and_archived(&pool).await;

    // 120 of raised funds spent, plus a 30 externally covered line
    fixture
        .allocations
        .create_allocation("admin-1", request(&fixture, dec!(120), true))
        .unwrap();
    fixture
        .allocations
        .create_allocation("admin-1", request(&fixture, dec!(30), false))
        .unwrap();

    let summary = fixture
        .allocations
        .get_beneficiary_summary(&fixture.beneficiary_id)
        .unwrap();

    assert_eq!(summary.total_allocated, dec!(150));
    assert_eq!(summary.total_donation_covered, dec!(120));
    // 200 raised minus 120 donation-covered; the external 30 does not
    // consume raised funds.
    assert_eq!(summary.remaining_to_allocate, dec!(80));
    // The goal was fully raised before archiving.
    assert_eq!(summary.remaining_to_raise, dec!(0));
    assert_eq!(summary.allocations.len(), 2);
}

#[tokio::test]
async fn concurrent_allocations_cannot_jointly_exceed_the_cap() {
    let (pool, _dir) = common::setup_pool();
    let fixture = funded_and_archived(&pool).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let pool = pool.clone();
        let req = request(&fixture, dec!(150), true);
        handles.push(std::thread::spawn(move || {
            AllocationService::new(pool).create_allocation("admin-1", req)
        }));
    }

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("allocation thread panicked"))
        .collect();

    // 150 + 150 against a 200 donation: exactly one side commits.
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let summary = fixture
        .allocations
        .get_beneficiary_summary(&fixture.beneficiary_id)
        .unwrap();
    assert_eq!(summary.total_allocated, dec!(150));
}
