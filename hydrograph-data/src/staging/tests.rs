//! Unit tests for staged files and the discard reconciliation.

use super::*;
use crate::parse::EntitySink;
use camino::Utf8PathBuf;
use hydrograph_core::{MemberRole, Node, Relation, Way};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Workspace {
    _tmp: TempDir,
    root: Utf8PathBuf,
}

#[fixture]
fn workspace() -> Workspace {
    let tmp = TempDir::new().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().join("tmp")).expect("utf-8 path");
    Workspace { _tmp: tmp, root }
}

fn river(id: i64, name: &str) -> Relation {
    let mut relation = Relation::new(id);
    relation.apply_tag("type", "waterway");
    relation.apply_tag("waterway", "river");
    relation.apply_tag("name", name);
    relation
}

fn read(area: &StagingArea, table: StagingTable) -> Vec<String> {
    area.read_table(table).expect("read staged table")
}

#[rstest]
fn stages_node_as_point(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let ((), rows) = area
        .stage(|writer| writer.accept_node(&Node::new(1, 2.5, 48.8).expect("valid node")))
        .expect("stage node");

    assert_eq!(rows.nodes, 1);
    assert_eq!(
        read(&area, StagingTable::Nodes),
        vec!["1|SRID=4326;POINT(2.500000 48.800000)"]
    );
}

#[rstest]
fn stages_way_with_node_sequence(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let mut way = Way::new(10);
    way.push_node(1);
    way.push_node(2);
    way.apply_tag("bridge", "yes");

    area.stage(|writer| writer.accept_way(&way)).expect("stage way");

    assert_eq!(read(&area, StagingTable::Ways), vec!["10|#10|bridge"]);
    assert_eq!(read(&area, StagingTable::NodesInWay), vec!["10|1", "10|2"]);
}

#[rstest]
fn untyped_way_has_null_type(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let mut way = Way::new(11);
    way.apply_tag("name", "Quai|Ouest");

    area.stage(|writer| writer.accept_way(&way)).expect("stage way");

    assert_eq!(read(&area, StagingTable::Ways), vec![r"11|Quai\|Ouest|"]);
}

#[rstest]
fn stages_river_with_members(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let mut relation = river(100, "Seine");
    relation.apply_tag("ref:sandre", "F---0000");
    relation.push_member(MemberRole::Way, 5);
    relation.push_member(MemberRole::Tributary, 200);
    relation.push_member(MemberRole::SideStream, 300);

    let ((), rows) = area
        .stage(|writer| writer.accept_relation(&relation))
        .expect("stage relation");

    assert_eq!(read(&area, StagingTable::Relations), vec!["100|Seine|river|F---0000"]);
    assert_eq!(read(&area, StagingTable::WaysInRel), vec!["100|5"]);
    assert_eq!(read(&area, StagingTable::Tributaries), vec!["100|200"]);
    assert_eq!(read(&area, StagingTable::DiscardedRels), vec!["300"]);
    assert_eq!(rows.get(StagingTable::Relations), 1);
}

#[rstest]
fn stages_boundary_without_sandre_code(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let mut relation = Relation::new(7);
    relation.apply_tag("admin_level", "8");
    relation.apply_tag("boundary", "administrative");
    relation.apply_tag("name:fr", "Paris");

    area.stage(|writer| writer.accept_relation(&relation))
        .expect("stage relation");

    assert_eq!(read(&area, StagingTable::Relations), vec!["7|Paris|boundary|"]);
}

#[rstest]
fn untyped_relation_only_stages_its_markers(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let mut relation = Relation::new(9);
    relation.apply_tag("type", "route");
    relation.push_member(MemberRole::Way, 1);
    relation.push_member(MemberRole::Tributary, 3);
    relation.push_member(MemberRole::SideStream, 2);

    let ((), rows) = area
        .stage(|writer| writer.accept_relation(&relation))
        .expect("stage relation");

    assert_eq!(
        rows,
        StagedRows {
            discarded_rels: 1,
            ..StagedRows::default()
        }
    );
    assert_eq!(read(&area, StagingTable::DiscardedRels), vec!["2"]);
    for table in StagingTable::LOAD_ORDER {
        assert!(read(&area, table).is_empty(), "{table} should be empty");
    }
}

#[rstest]
fn new_run_truncates_previous_rows(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    area.stage(|writer| writer.accept_node(&Node::new(1, 0.0, 0.0).expect("valid node")))
        .expect("first run");
    area.stage(|writer| writer.accept_node(&Node::new(2, 0.0, 0.0).expect("valid node")))
        .expect("second run");

    assert_eq!(
        read(&area, StagingTable::Nodes),
        vec!["2|SRID=4326;POINT(0.000000 0.000000)"]
    );
}

#[rstest]
fn aborted_stage_still_flushes_rows(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let outcome: Result<((), StagedRows), StagingError> = area.stage(|writer| {
        writer.accept_node(&Node::new(3, 1.0, 1.0).expect("valid node"))?;
        Err(StagingError::NotADirectory {
            path: Utf8PathBuf::from("abort"),
        })
    });

    assert!(outcome.is_err());
    assert_eq!(read(&area, StagingTable::Nodes).len(), 1);
}

#[rstest]
fn dropped_writer_flushes_rows(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    {
        let mut writer = area.writer().expect("open writer");
        writer
            .accept_node(&Node::new(4, 1.0, 1.0).expect("valid node"))
            .expect("stage node");
        assert_eq!(writer.rows().nodes, 1);
    }

    assert_eq!(read(&area, StagingTable::Nodes).len(), 1);
}

#[rstest]
fn prepare_creates_nested_directory(workspace: Workspace) {
    let nested = workspace.root.join("deeper/still");
    let area = StagingArea::prepare(nested.clone()).expect("prepare nested staging");

    assert!(nested.is_dir());
    assert_eq!(area.root(), nested.as_path());
    assert_eq!(
        area.table_path(StagingTable::Relations),
        nested.join("relations_data")
    );
}

#[rstest]
fn prepare_rejects_existing_file(workspace: Workspace) {
    let parent = workspace.root.parent().expect("temp parent");
    let occupied = parent.join("occupied");
    std::fs::write(&occupied, b"not a directory").expect("write blocker");

    let err = StagingArea::prepare(occupied).expect_err("file should block staging");
    assert!(matches!(err, StagingError::NotADirectory { .. }), "got {err:?}");
}

#[rstest]
fn reconcile_removes_relations_marked_later(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let first = river(100, "Seine");
    let mut second = river(101, "Marne");
    second.push_member(MemberRole::SideStream, 100);
    let third = river(102, "Oise");

    area.stage(|writer| {
        writer.accept_relation(&first)?;
        writer.accept_relation(&second)?;
        writer.accept_relation(&third)
    })
    .expect("stage relations");
    let report = area.reconcile_discarded().expect("reconcile");

    assert_eq!(
        report,
        ReconcileReport {
            discarded_ids: 1,
            kept: 2,
            removed: 1,
            malformed_markers: 0,
        }
    );
    assert_eq!(
        read(&area, StagingTable::Relations),
        vec!["101|Marne|river|", "102|Oise|river|"]
    );
    assert!(!workspace.root.join("relations_data.tmp").exists());
}

#[rstest]
fn reconcile_honours_markers_from_untyped_relations(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    let target = river(1, "Ourcq");
    let mut canal = Relation::new(2);
    canal.apply_tag("type", "waterway");
    canal.apply_tag("waterway", "canal");
    canal.push_member(MemberRole::SideStream, 1);

    area.stage(|writer| {
        writer.accept_relation(&target)?;
        writer.accept_relation(&canal)
    })
    .expect("stage relations");
    let report = area.reconcile_discarded().expect("reconcile");

    assert!(read(&area, StagingTable::Relations).is_empty());
    assert_eq!(report.discarded_ids, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(report.kept, 0);
}

#[rstest]
fn reconcile_skips_malformed_markers(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    area.stage(|writer| writer.accept_relation(&river(5, "Loire")))
        .expect("stage relation");
    std::fs::write(
        area.table_path(StagingTable::DiscardedRels),
        "not-an-id\n\n6\n6\n",
    )
    .expect("write discard list");

    let report = area.reconcile_discarded().expect("reconcile");

    assert_eq!(report.malformed_markers, 1);
    assert_eq!(report.discarded_ids, 1);
    assert_eq!(report.kept, 1);
    assert_eq!(read(&area, StagingTable::Relations), vec!["5|Loire|river|"]);
}

#[rstest]
fn reconcile_without_staged_relations_fails(workspace: Workspace) {
    let area = StagingArea::prepare(workspace.root.clone()).expect("prepare staging");
    area.stage(|_| Ok::<_, StagingError>(())).expect("stage nothing");
    std::fs::remove_file(area.table_path(StagingTable::Relations)).expect("remove relations");

    let err = area
        .reconcile_discarded()
        .expect_err("missing relations file should fail");
    assert!(
        matches!(err, StagingError::OpenTable { table: StagingTable::Relations, .. }),
        "got {err:?}"
    );
    assert!(!workspace.root.join("relations_data.tmp").exists());
}
