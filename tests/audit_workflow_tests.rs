use std::path::PathBuf;

use tempfile::TempDir;

use parloraudit::{
    AuditReport, AuditSection, AuditStatus, AuditStore, AuditWorkspace, GuidelineCatalog,
    ParameterStatus,
};

fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("audits.db")
}

/// Starts a seeded audit, fills it in over two editing sessions, completes
/// it and checks everything downstream: entries, listings, statistics and
/// the report model.
#[tokio::test]
async fn test_full_audit_lifecycle() {
    let dir = TempDir::new().expect("temp dir");
    let catalog = GuidelineCatalog::standard();

    // Day one: a new audit, farm info and milking measurements
    let mut workspace = AuditWorkspace::create_seeded(db_path(&dir))
        .await
        .expect("create seeded audit");
    let id = workspace.id();

    assert_eq!(workspace.session().progress(AuditSection::FarmInfo), 0.6);
    assert_eq!(workspace.session().missing_count(AuditSection::FarmInfo), 2);
    assert_eq!(workspace.session().progress(AuditSection::MilkingTime), 0.0);

    workspace.mutate(|session| {
        let info = session.farm_info.as_mut().unwrap();
        info.dairy_name = "Meadowbrook Dairy".to_string();
        info.prepared_by = "J. Carter".to_string();
        info.number_of_cows = 480;
        info.milking_frequency = 3;

        for (i, row) in session.milking_time_rows.iter_mut().enumerate() {
            row.avg_vac = Some(13.4);
            row.max_vac = Some(14.1);
            row.min_vac = Some(12.8);
            row.flow_rate = Some(if i == 2 { 9.5 } else { 4.0 });
        }
    });

    assert_eq!(workspace.session().progress(AuditSection::FarmInfo), 1.0);
    assert_eq!(workspace.session().missing_count(AuditSection::FarmInfo), 0);
    assert_eq!(workspace.session().progress(AuditSection::MilkingTime), 1.0);

    workspace.save_draft().await.expect("save draft");

    let store = AuditStore::new(&db_path(&dir)).expect("open store");
    let drafts = store.list_drafts().expect("list drafts");
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].farm_name.as_deref(), Some("Meadowbrook Dairy"));
    assert_eq!(drafts[0].technician.as_deref(), Some("J. Carter"));
    drop(store);

    workspace.close().await.expect("close draft");

    // Day two: resume, pulsation and diagnostics, then complete
    let mut workspace = AuditWorkspace::open(db_path(&dir), id)
        .await
        .expect("resume draft");
    assert_eq!(
        workspace.session().farm_info.as_ref().unwrap().dairy_name,
        "Meadowbrook Dairy"
    );
    assert_eq!(workspace.session().progress(AuditSection::MilkingTime), 1.0);

    workspace.mutate(|session| {
        for row in &mut session.pulsator_rows {
            row.ratio_front = Some(64.0);
            row.ratio_rear = Some(66.0);
            row.rate = Some(60.0);
        }
        let averages = session.pulsation_averages.as_mut().unwrap();
        averages.ratio1 = Some(64.0);
        averages.ratio2 = Some(66.0);
        averages.rate = Some(60.0);

        let diag = session.diagnostics.as_mut().unwrap();
        diag.step1_receiver_vac = Some(14.2);
        diag.step1_pump_inlet_vac = Some(15.8);
        diag.step1_pulsator_airline_vac = Some(11.0);

        let detacher = session.detacher_settings.as_mut().unwrap();
        detacher.cluster_removal_delay = Some(1.0);
        detacher.blink_time_delay = Some(0.5);
        detacher.detach_flow_setting = Some(1.0);
        detacher.let_down_delay = Some(0.8);

        session.recommendations[0].text =
            "Verify regulator response time at next service".to_string();
    });

    assert_eq!(workspace.session().progress(AuditSection::Pulsators), 1.0);
    assert_eq!(workspace.session().missing_count(AuditSection::Diagnostics), 6);
    assert_eq!(
        workspace.session().progress(AuditSection::Recommendations),
        1.0
    );

    let entries = workspace.finish(&catalog).await.expect("complete audit");

    // All ten derivable readings were captured; the 1.6 in Hg vacuum
    // reserve (15.8 pump inlet - 14.2 receiver) is the one sore spot
    assert_eq!(entries.len(), 10);
    let reserve = entries
        .iter()
        .find(|e| e.parameter == "Vacuum Reserve")
        .expect("vacuum reserve entry");
    assert!((reserve.value - 1.6).abs() < 1e-9);
    assert_eq!(reserve.status, ParameterStatus::Low);
    assert_eq!(
        entries
            .iter()
            .filter(|e| e.status == ParameterStatus::Normal)
            .count(),
        9
    );

    // Downstream views agree
    let store = AuditStore::new(&db_path(&dir)).expect("reopen store");
    assert!(store.list_drafts().expect("drafts").is_empty());
    let completed = store.list_completed().expect("completed");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, id);
    assert_eq!(completed[0].status, AuditStatus::Completed);

    let stats = store.statistics(None).expect("statistics");
    assert_eq!(stats.total_audits, 1);
    assert_eq!(stats.normal_readings, 9);
    assert_eq!(stats.warning_issues, 1);
    assert_eq!(stats.critical_issues, 0);
    assert!((stats.warning_percentage() - 10.0).abs() < 1e-9);

    let report = AuditReport::build(&completed[0], &entries, &catalog);
    assert_eq!(report.farm_name.as_deref(), Some("Meadowbrook Dairy"));
    assert_eq!(report.total_readings(), 10);
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.parameter, "Vacuum Reserve");
    assert_eq!(issue.acceptable_min, Some(2.0));
    // Three remediation steps plus the status note, deduplicated union
    assert_eq!(report.recommended_actions.len(), 4);
}

/// A dropped workspace (crash, force quit) loses nothing that autosave
/// already wrote; reopening picks the draft up from the last save.
#[tokio::test]
async fn test_reopen_after_dropped_workspace() {
    let dir = TempDir::new().expect("temp dir");

    let mut workspace = AuditWorkspace::create_seeded(db_path(&dir))
        .await
        .expect("create seeded audit");
    let id = workspace.id();

    workspace.mutate(|session| {
        session.notes = "Pulsator 3 sounded rough during milking".to_string();
        session.milking_time_rows[0].avg_vac = Some(13.1);
    });
    workspace.save_draft().await.expect("save draft");

    // No close(): simulate the process dying
    drop(workspace);

    let workspace = AuditWorkspace::open(db_path(&dir), id)
        .await
        .expect("reopen after drop");
    assert_eq!(
        workspace.session().notes,
        "Pulsator 3 sounded rough during milking"
    );
    assert_eq!(workspace.session().milking_time_rows[0].avg_vac, Some(13.1));
    workspace.close().await.expect("close");
}

/// Deleting a draft twice is a no-op the second time.
#[tokio::test]
async fn test_double_delete_is_noop() {
    let dir = TempDir::new().expect("temp dir");

    let workspace = AuditWorkspace::create_seeded(db_path(&dir))
        .await
        .expect("create seeded audit");
    let id = workspace.id();
    workspace.close().await.expect("close");

    let store = AuditStore::new(&db_path(&dir)).expect("open store");
    assert_eq!(store.list_drafts().expect("drafts").len(), 1);

    store.delete_audit(id).expect("first delete");
    assert!(store.list_drafts().expect("drafts").is_empty());

    store.delete_audit(id).expect("second delete is silent");
    assert!(store.get(id).expect("get").is_none());
}

/// Audits attached to a registered farm show up in the farm-scoped
/// listing and statistics.
#[tokio::test]
async fn test_farm_scoped_history() {
    let dir = TempDir::new().expect("temp dir");
    let catalog = GuidelineCatalog::standard();

    let store = AuditStore::new(&db_path(&dir)).expect("open store");
    let farm = store
        .create_farm("Meadowbrook Dairy", "Tulare, CA", "R. Ortega", "555-0142")
        .expect("register farm");
    drop(store);

    let mut workspace = AuditWorkspace::create_seeded(db_path(&dir))
        .await
        .expect("create seeded audit");
    let id = workspace.id();
    let farm_key = farm.id.to_string();
    workspace.mutate(|session| {
        session.farm_id = Some(farm.id.to_string());
        for row in &mut session.milking_time_rows {
            row.avg_vac = Some(13.5);
        }
    });
    workspace.finish(&catalog).await.expect("complete");

    let store = AuditStore::new(&db_path(&dir)).expect("reopen store");
    let for_farm = store.list_for_farm(&farm_key).expect("farm audits");
    assert_eq!(for_farm.len(), 1);
    assert_eq!(for_farm[0].id, id);

    let scoped = store.statistics(Some(&farm_key)).expect("farm stats");
    assert_eq!(scoped.total_audits, 1);
    assert_eq!(scoped.normal_readings, 1);

    let elsewhere = store.statistics(Some("some-other-farm")).expect("stats");
    assert_eq!(elsewhere.total_audits, 0);
    assert_eq!(elsewhere.total_readings(), 0);
}
