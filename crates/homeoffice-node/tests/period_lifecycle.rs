//! End-to-end period lifecycle against on-disk storage.

use chrono::NaiveDate;
use homeoffice_node::{
    CloseRequest, Error, GrantFilter, NominationRequest, OpenPeriodRequest, Period, Service,
    Storage, User, VoteRequest,
};
use homeoffice_tally::{ProblemKind, Role, RolePolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

struct Team {
    service: Service,
    period: Period,
    dir: TempDir,
}

impl Team {
    fn new(seed: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        let service =
            Service::new(storage, RolePolicy::default()).with_rng(StdRng::seed_from_u64(seed));
        let period = service
            .open_period(
                OpenPeriodRequest {
                    week_label: "2024-W12".into(),
                    start_date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 3, 22).unwrap(),
                },
                None,
            )
            .unwrap();
        Self {
            service,
            period,
            dir,
        }
    }

    fn user(&self, name: &str, role: Role) -> User {
        let user = User::new(name.into(), format!("{}@example.com", name.to_lowercase()), role);
        self.service.put_user(&user).unwrap();
        user
    }

    fn nominate(&self, nominator: &User, nominee: &User) -> Result<Uuid, Error> {
        self.service
            .nominate(NominationRequest {
                period_id: self.period.id,
                nominator_id: nominator.id,
                nominee_id: nominee.id,
                reason: format!("{} unblocked the release", nominee.name),
                project_id: None,
                category: None,
                contribution_type: None,
            })
            .map(|view| view.nomination.id)
    }

    fn vote(&self, voter: &User, target: &User) {
        self.service
            .cast_vote(VoteRequest {
                period_id: self.period.id,
                voter_id: voter.id,
                target_user_id: target.id,
                comment: None,
            })
            .unwrap();
    }

    fn close(&self, force: bool) -> Result<homeoffice_node::ClosureSummary, Error> {
        self.service.close_period(
            self.period.id,
            CloseRequest {
                force,
                actor_id: None,
            },
        )
    }
}

#[test]
fn two_candidates_are_tallied_with_one_discard() {
    let team = Team::new(7);
    let mo = team.user("Mo", Role::Manager);
    let dev = team.user("Dev", Role::LeaderDev);
    let po = team.user("Po", Role::LeaderPo);
    let a = team.user("Ana", Role::Member);
    let b = team.user("Ben", Role::Member);

    team.nominate(&mo, &a).unwrap();
    team.nominate(&dev, &b).unwrap();
    team.nominate(&po, &b).unwrap();

    team.vote(&mo, &a);
    team.vote(&dev, &a);
    team.vote(&mo, &b);
    team.vote(&dev, &b);
    team.vote(&po, &b);

    let summary = team.close(false).unwrap();
    let discarded = summary.discarded_voter_id.expect("leaders voted, so one is discarded");

    let results = team.service.results(team.period.id).unwrap();
    assert_eq!(results.len(), 2);
    let days_of = |user: &User| {
        results
            .iter()
            .find(|r| r.tally.user_id == user.id)
            .map(|r| r.tally.result_days)
            .unwrap()
    };

    // A keeps both votes only when Po's ballot is the discarded one; B always
    // ends at two counted votes.
    let expected_a = if discarded == po.id { 1 } else { 0 };
    assert_eq!(days_of(&a), expected_a);
    assert_eq!(days_of(&b), 1);
    assert!(results.windows(2).all(|w| w[0].tally.result_days >= w[1].tally.result_days));
    assert_eq!(
        results[0].discarded_voter.as_ref().map(|u| u.id),
        Some(discarded)
    );

    let b_tally = &results.iter().find(|r| r.tally.user_id == b.id).unwrap().tally;
    assert_eq!(b_tally.raw_votes, 3);
    assert_eq!(b_tally.counted_votes, 2);
    assert_eq!(b_tally.manager_included, discarded != mo.id);

    let b_grants = team.service.grants_for(b.id, GrantFilter::Available).unwrap();
    assert_eq!(b_grants.len(), 1);
    assert_eq!(summary.grants_issued, 1 + expected_a as usize);
}

#[test]
fn missing_leader_blocks_until_forced() {
    let team = Team::new(3);
    let mo = team.user("Mo", Role::Manager);
    let lead = team.user("Lou", Role::Leader);
    let dev = team.user("Dev", Role::LeaderDev);
    let ana = team.user("Ana", Role::Member);

    team.nominate(&mo, &ana).unwrap();
    team.nominate(&lead, &ana).unwrap();
    team.nominate(&dev, &ana).unwrap();
    team.vote(&mo, &ana);
    team.vote(&dev, &ana);

    let report = match team.close(false) {
        Err(Error::ValidationRequired(report)) => report,
        other => panic!("expected validation report, got {:?}", other),
    };
    assert!(report.can_force);
    assert_eq!(report.summary, "Missing: 1 votes, 0 nominations");
    let missing = report.problem(ProblemKind::MissingVotes).unwrap();
    assert_eq!(missing.users.len(), 1);
    assert_eq!(missing.users[0].id, lead.id);
    assert_eq!(missing.users[0].role, Role::Leader);
    assert!(!team.service.get_period(team.period.id).unwrap().is_closed());

    let summary = team.close(true).unwrap();
    assert!(summary.forced);
    assert!(summary.period.is_closed());
    let tally = &summary.tallies[0];
    assert_eq!(tally.raw_votes, 2);
    assert_eq!(tally.counted_votes, 1);
    assert_eq!(tally.result_days, 0);

    assert!(matches!(team.close(true), Err(Error::InvalidState(_))));
}

#[test]
fn candidate_pool_follows_nominations() {
    let team = Team::new(1);
    let mo = team.user("Mo", Role::Manager);
    let dev = team.user("Dev", Role::LeaderDev);
    let ana = team.user("Ana", Role::Member);

    let first = team.nominate(&mo, &ana).unwrap();
    assert!(matches!(
        team.nominate(&mo, &ana),
        Err(Error::DuplicateNomination)
    ));
    let second = team.nominate(&dev, &ana).unwrap();

    team.service.withdraw(first).unwrap();
    assert_eq!(team.service.list_candidates(team.period.id).unwrap().len(), 1);

    team.service.withdraw(second).unwrap();
    assert!(team.service.list_candidates(team.period.id).unwrap().is_empty());

    let err = team
        .service
        .cast_vote(VoteRequest {
            period_id: team.period.id,
            voter_id: mo.id,
            target_user_id: ana.id,
            comment: None,
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCandidate(_)));
}

#[test]
fn repeat_vote_does_not_double_count() {
    let team = Team::new(11);
    let mo = team.user("Mo", Role::Manager);
    let ana = team.user("Ana", Role::Member);
    team.nominate(&mo, &ana).unwrap();

    team.vote(&mo, &ana);
    team.vote(&mo, &ana);
    assert_eq!(team.service.list_votes(team.period.id).unwrap().len(), 1);

    let summary = team.close(false).unwrap();
    assert_eq!(summary.tallies[0].raw_votes, 1);
}

#[test]
fn concurrent_closes_award_once() {
    let team = Team::new(5);
    let mo = team.user("Mo", Role::Manager);
    let leads: Vec<User> = ["Lou", "Dev", "Po"]
        .iter()
        .zip([Role::Leader, Role::LeaderDev, Role::LeaderPo])
        .map(|(name, role)| team.user(name, role))
        .collect();
    let ana = team.user("Ana", Role::Member);

    for voter in std::iter::once(&mo).chain(&leads) {
        team.nominate(voter, &ana).unwrap();
        team.vote(voter, &ana);
    }

    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| team.close(false))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(outcomes
        .iter()
        .filter_map(|o| o.as_ref().err())
        .all(|e| matches!(e, Error::InvalidState(_))));

    let grants = team.service.grants_for(ana.id, GrantFilter::All).unwrap();
    let tally = &team.service.results(team.period.id).unwrap()[0].tally;
    assert_eq!(tally.counted_votes, 3);
    assert_eq!(grants.len(), tally.result_days as usize);
}

#[test]
fn closed_period_survives_reopen() {
    let team = Team::new(9);
    let mo = team.user("Mo", Role::Manager);
    let ana = team.user("Ana", Role::Member);
    team.nominate(&mo, &ana).unwrap();
    team.vote(&mo, &ana);
    team.close(false).unwrap();

    let Team {
        service,
        period,
        dir,
    } = team;
    drop(service);

    let storage = Storage::open(dir.path()).unwrap();
    let reopened = storage.get_period(period.id).unwrap().unwrap();
    assert!(reopened.is_closed());
    assert_eq!(storage.list_tallies(period.id).unwrap().len(), 1);
    assert!(storage
        .recent_audit(10)
        .unwrap()
        .iter()
        .any(|e| e.period_id == period.id));
}
