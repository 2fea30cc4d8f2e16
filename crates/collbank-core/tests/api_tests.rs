//! Integration tests for the CollbankApi public interface.
//!
//! These drive the catalogue end to end: vocabulary import, storing a
//! collection, exporting it, repairing and publishing a VLO item, and the
//! startup migrations on reopen.

use collbank_core::cmdi::XmlSource;
use collbank_core::model::Resource;
use collbank_core::{
    ArchiveFormat, CatalogueStore, CollbankApi, CollbankError, Collection, PublicationState,
    PublishConfig,
};
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const FIXTURE: &str = "field\tenglish_name\tdutch_name\tmachine_value\n\
                       resource.type\ttext\ttekst\t1\n\
                       resource.type\ttext: corpus\ttekst: corpus\t2\n\
                       resource.modality\twritten\tgeschreven\t1\n";

const ORAL_HISTORY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CMD xmlns="http://www.clarin.eu/cmd/">
  <Header>
    <MdProfile>clarin.eu:cr1:p_1</MdProfile>
  </Header>
  <Resources>
    <ResourceProxyList>
      <ResourceProxy id="landing">
        <ResourceType>landingpage</ResourceType>
        <ResourceRef>https://example.org/oh/42</ResourceRef>
      </ResourceProxy>
    </ResourceProxyList>
  </Resources>
  <Components>
    <OralHistoryInterviewCRF>
      <ID>oh-42</ID>
      <Interviewee>anonymous</Interviewee>
    </OralHistoryInterviewCRF>
  </Components>
</CMD>
"#;

/// Create an API rooted in a temp dir, with the sample vocabulary loaded.
async fn create_test_api() -> (CollbankApi, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let api = open_api(temp_dir.path());

    let fixture = temp_dir.path().join("vocabulary.tsv");
    fs::write(&fixture, FIXTURE).unwrap();
    api.import_vocabulary(&fixture).await.unwrap();

    (api, temp_dir)
}

fn open_api(root: &Path) -> CollbankApi {
    CollbankApi::builder(root.join("data"))
        .publish_config(PublishConfig::under(root, "https://example.org/registry/"))
        .build()
        .unwrap()
}

fn sample() -> Collection {
    Collection {
        identifier: "ABC12".into(),
        titles: vec!["Sample Corpus".into()],
        resources: vec![Resource {
            dc_type: Some(1),
            subtype: Some(2),
            modalities: vec![1],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn set_mtime(path: &Path, when: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

#[tokio::test]
async fn test_export_sample_collection() {
    let (api, _temp_dir) = create_test_api().await;
    let id = api.save_collection(sample()).unwrap();

    let exported = api.export_collection(id, false, None).await.unwrap();
    let xml = &exported.xml;
    let title = xml.find("<title>Sample Corpus</title>").unwrap();
    let resource_type = xml.find("<type>text: corpus</type>").unwrap();
    assert!(title < resource_type);
    assert!(xml.contains("<modality>written</modality>"));
    assert!(!xml.contains("<owner>"));

    let again = api.export_collection(id, false, None).await.unwrap();
    assert_eq!(exported, again);
}

#[tokio::test]
async fn test_bulk_export_zip() {
    let (api, temp_dir) = create_test_api().await;
    let first = api.save_collection(sample()).unwrap();
    let mut other = sample();
    other.identifier = "XYZ".into();
    other.titles = vec!["Other Corpus".into()];
    let second = api.save_collection(other).unwrap();

    let output = temp_dir.path().join("bundle.zip");
    let export = api
        .export_collections(&[first, second], &output, ArchiveFormat::Zip)
        .await
        .unwrap();
    assert_eq!(export.count, 2);
    assert!(export.skipped.is_empty());
    assert!(fs::metadata(&output).unwrap().len() > 0);

    let err = api
        .export_collections(&[first, 999], &output, ArchiveFormat::Xml)
        .await
        .unwrap_err();
    assert!(matches!(err, CollbankError::NotFound { .. }));
}

#[tokio::test]
async fn test_publish_collection_checks_profile() {
    let (api, temp_dir) = create_test_api().await;
    let id = api.save_collection(sample()).unwrap();
    assert_eq!(api.validate_collection(id, Some("editor")).await.unwrap(), vec![]);

    let report = api.publish_collection(id, Some("editor")).await.unwrap();
    assert!(report.success);
    assert_eq!(api.evaluate_collection(id).unwrap(), PublicationState::Published);

    let mut broken = api.get_collection(id).unwrap();
    broken.resources[0].modalities = vec![99];
    api.save_collection(broken).unwrap();
    let issues = api.validate_collection(id, None).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "missing required modality");

    let registry = temp_dir.path().join("registry").join(format!("cbmetadata_{:05}", id));
    let published = fs::read_to_string(&registry).unwrap();
    let err = api.publish_collection(id, Some("editor")).await.unwrap_err();
    assert!(matches!(err, CollbankError::Validation { .. }));
    assert_eq!(fs::read_to_string(&registry).unwrap(), published);
    assert_eq!(api.evaluate_collection(id).unwrap(), PublicationState::Stale);
}

#[tokio::test]
async fn test_vlo_item_repair_publish_cycle() {
    let (api, temp_dir) = create_test_api().await;
    let id = api
        .create_vlo_item("oh", "Voices of the dike", XmlSource::Text(ORAL_HISTORY.into()), None)
        .unwrap();
    assert_eq!(api.evaluate_item(id).unwrap(), PublicationState::Unpublished);

    let repaired = api.repair_item(id, Some("hdl:21.11114/COLL-0000-0042")).unwrap();
    assert!(repaired.changed);
    assert!(repaired.xml.contains(&format!("id=\"lp_ohmetadata_{:05}\"", id)));
    assert!(repaired.xml.contains(">LandingPage</ResourceType>"));
    let id_pos = repaired.xml.find("<ID>oh-42</ID>").unwrap();
    let title_pos = repaired.xml.find("<Title>Voices of the dike</Title>").unwrap();
    let interviewee_pos = repaired.xml.find("<Interviewee>").unwrap();
    assert!(id_pos < title_pos && title_pos < interviewee_pos);

    let second = api.repair_item(id, Some("hdl:21.11114/COLL-0000-0042")).unwrap();
    assert!(!second.changed);
    assert_eq!(second.xml, repaired.xml);

    let report = api.publish_item(id).unwrap();
    assert!(report.success);
    let registry = temp_dir
        .path()
        .join("registry")
        .join(format!("oh_vlometadata_{:05}", id));
    assert_eq!(fs::read_to_string(&registry).unwrap(), repaired.xml);
    assert_eq!(api.evaluate_item(id).unwrap(), PublicationState::Published);

    let edited: SystemTime = api.get_vlo_item(id).unwrap().updated_at.unwrap().into();
    set_mtime(&registry, edited + Duration::from_secs(5));
    assert_eq!(api.evaluate_item(id).unwrap(), PublicationState::Published);
    set_mtime(&registry, edited - Duration::from_secs(5));
    assert_eq!(api.evaluate_item(id).unwrap(), PublicationState::Stale);
}

#[tokio::test]
async fn test_register_pid_without_service_is_a_status() {
    let (api, _temp_dir) = create_test_api().await;
    let id = api
        .create_vlo_item("oh", "x", XmlSource::Text(ORAL_HISTORY.into()), None)
        .unwrap();
    let registration = api.register_pid(id).await.unwrap();
    assert!(!registration.is_ok());
    assert!(api.get_vlo_item(id).unwrap().pid.pidname.is_none());
}

#[tokio::test]
async fn test_reopen_runs_migrations() {
    let temp_dir = TempDir::new().unwrap();
    {
        let api = open_api(temp_dir.path());
        let fixture = temp_dir.path().join("vocabulary.tsv");
        fs::write(&fixture, FIXTURE).unwrap();
        api.import_vocabulary(&fixture).await.unwrap();
    }

    // a legacy row written without the split type
    let store = CatalogueStore::open_in(&temp_dir.path().join("data")).unwrap();
    let mut legacy = sample();
    legacy.resources = vec![
        Resource {
            type_mv: Some(2),
            ..Default::default()
        },
        Resource::default(),
    ];
    let id = store.save_collection(&mut legacy).unwrap();
    drop(store);

    let api = open_api(temp_dir.path());
    let coll = api.get_collection(id).unwrap();
    assert_eq!(coll.resources.len(), 1);
    assert_eq!(coll.resources[0].dc_type, Some(1));
    assert_eq!(coll.resources[0].subtype, Some(2));
    assert_eq!(coll.updated_at, legacy.updated_at);
}
