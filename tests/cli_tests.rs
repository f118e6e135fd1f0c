//! End-to-end tests of the `longread-qc` binary.
//!
//! External tools are replaced by small shell scripts installed into a
//! directory named by `LONGREAD_QC_TOOLS_DIR`. Every command runs with
//! `TMPDIR` pointing at a private directory so the tests can check that no
//! scratch space is left behind.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use longread_qc::Artifact;
use predicates::prelude::*;
use tempfile::TempDir;

const FAKE_MINIMAP2: &str = r#"mode=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --version) echo "2.28-fake"; exit 0 ;;
    -d) mode=index; out="$2"; shift ;;
    -c) mode=search ;;
    -a) mode=align ;;
    -o) out="$2"; shift ;;
  esac
  shift
done
touch "$FAKE_MARKER"
case "$mode" in
  index) printf 'MMI\001' > "$out" ;;
  search) cp "$FAKE_PAF" "$out" ;;
  align) cp "$FAKE_SAM" "$out" ;;
esac"#;

const FAKE_SAMTOOLS: &str = r#"fmt="$1"
if [ "$fmt" = "--version" ]; then echo "samtools 1.21-fake"; exit 0; fi
shift
while [ $# -gt 0 ]; do
  case "$1" in
    -0) out="$2"; shift ;;
    -1) first="$2"; shift ;;
    -2) second="$2"; shift ;;
    -s) single="$2"; shift ;;
    -@) shift ;;
    -n) ;;
    *) input="$1" ;;
  esac
  shift
done
: > "$single"
if [ -n "$first" ]; then
  awk -F'\t' '!/^@/ && int($2 / 64) % 2 == 1 { print "@" $1; print $10; print "+"; print $11 }' "$input" > "$first"
  awk -F'\t' '!/^@/ && int($2 / 128) % 2 == 1 { print "@" $1; print $10; print "+"; print $11 }' "$input" > "$second"
elif [ "$fmt" = "fasta" ]; then
  awk -F'\t' '!/^@/ { print ">" $1; print $10 }' "$input" > "$out"
else
  awk -F'\t' '!/^@/ { print "@" $1; print $10; print "+"; print $11 }' "$input" > "$out"
fi"#;

const FAKE_NANOPLOT: &str = r#"if [ "$1" = "--version" ]; then echo "NanoPlot 1.43.0"; exit 0; fi
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
  esac
  shift
done
mkdir -p "$out"
echo "<html>report</html>" > "$out/NanoPlot-report.html"
echo "Mean read length: 8.0" > "$out/NanoStats.txt""#;

const REFERENCE_FASTA: &str = ">ref1\nACGTACGTAC\n>ref2\nGGGGCCCCAA\n";

const QUERY_FASTA: &str = ">r1\nACGTACGT\n>r2\nTTTTGGGG\n>r3\nCCCCAAAA\n";

/// r1 aligns perfectly, r2 does not align, r3 aligns with 6 edits over 8 bases
const ALIGNED_SAM: &str = "@HD\tVN:1.6\n\
@SQ\tSN:ref1\tLN:10\n\
r1\t0\tref1\t1\t60\t8M\t*\t0\t0\tACGTACGT\t*\tNM:i:0\n\
r2\t4\t*\t0\t0\t*\t*\t0\t0\tTTTTGGGG\t*\n\
r3\t0\tref1\t1\t60\t8M\t*\t0\t0\tCCCCAAAA\t*\tNM:i:6\n";

const SEARCH_PAF: &str = "q1\t100\t0\t100\t+\tref1\t1000\t0\t100\t95\t100\t60\n\
q1\t100\t0\t100\t+\tref2\t1000\t0\t100\t90\t100\t60\n\
q2\t100\t0\t0\t*\t*\t0\t0\t0\t0\t0\t0\n";

const REFERENCE_TAXONOMY: &str = "Feature ID\tTaxon\n\
ref1\tk__Bacteria; p__Proteobacteria; c__Gammaproteobacteria\n\
ref2\tk__Bacteria; p__Firmicutes; c__Bacilli\n";

const READS_FASTQ: &str = "@read1\nACGTACGT\n+\nIIIIIIII\n@read2\nGGGGCCCC\n+\nIIIIIIII\n";

/// Scratch workspace with fake tools and a private temporary directory
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("tmp")).unwrap();
        fs::create_dir(dir.path().join("tools")).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn install(&self, name: &str, script: &str) {
        let path = self.path("tools").join(name);
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn install_fakes(&self) {
        self.install("minimap2", FAKE_MINIMAP2);
        self.install("samtools", FAKE_SAMTOOLS);
        self.install("NanoPlot", FAKE_NANOPLOT);
        self.install(
            "chopper",
            "if [ \"$1\" = \"--version\" ]; then echo chopper 0.9.0; exit 0; fi\nexec cat",
        );
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("longread-qc").unwrap();
        cmd.current_dir(self.dir.path())
            .env("TMPDIR", self.path("tmp"))
            .env("LONGREAD_QC_TOOLS_DIR", self.path("tools"))
            .env("FAKE_MARKER", self.path("tool-ran"))
            .env("FAKE_SAM", self.path("aligned.sam"))
            .env("FAKE_PAF", self.path("search.paf"));
        cmd
    }

    fn import(&self, artifact_type: &str, input: &Path, output: &str) -> PathBuf {
        self.cmd()
            .args(["import", "--type", artifact_type, "--input-path"])
            .arg(input)
            .args(["--output-path", output])
            .assert()
            .success();
        self.path(output)
    }

    fn tmp_is_empty(&self) -> bool {
        fs::read_dir(self.path("tmp")).unwrap().next().is_none()
    }
}

fn payload(artifact: &Path, file: &str) -> String {
    fs::read_to_string(artifact.join("data").join(file)).unwrap()
}

/// Read ids of one gzip FASTQ file inside an artifact
fn read_ids(artifact: &Path, file: &str) -> Vec<String> {
    longread_qc::formats::fastq::read_fastq(&artifact.join("data").join(file))
        .unwrap()
        .ids()
        .map(String::from)
        .collect()
}

const PAIRED_TYPE: &str = "SampleData[PairedEndSequencesWithQuality]";

const PAIRED_MANIFEST: &str = "sample-id,filename,direction\n\
S1,S1_0_L001_R1_001.fastq.gz,forward\n\
S1,S1_0_L001_R2_001.fastq.gz,reverse\n";

/// Import one paired sample `S1` from Casava-named files
fn import_paired(ws: &Workspace, forward: &str, reverse: &str) -> PathBuf {
    ws.write("paired/S1_0_L001_R1_001.fastq", forward);
    ws.write("paired/S1_0_L001_R2_001.fastq", reverse);
    ws.import(PAIRED_TYPE, &ws.path("paired"), "paired.qza")
}

#[test]
fn test_import_peek_export() {
    let ws = Workspace::new();
    let fasta = ws.write("refs.fasta", ">ref1 desc\nACGT\nACGT\n");
    let artifact = ws.import("FeatureData[Sequence]", &fasta, "refs.qza");

    assert_eq!(payload(&artifact, "dna-sequences.fasta"), ">ref1\nACGTACGT\n");

    ws.cmd()
        .args(["peek", "refs.qza", "--verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Type: FeatureData[Sequence]"))
        .stdout(predicate::str::contains("Action: import"))
        .stdout(predicate::str::contains("Checksums: OK"));

    ws.cmd()
        .args(["export", "--input-path", "refs.qza", "--output-path", "exported"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(ws.path("exported/dna-sequences.fasta")).unwrap(),
        ">ref1\nACGTACGT\n"
    );
    assert!(ws.tmp_is_empty());
}

#[test]
fn test_peek_json() {
    let ws = Workspace::new();
    let taxonomy = ws.write("taxonomy.tsv", REFERENCE_TAXONOMY);
    ws.import("FeatureData[Taxonomy]", &taxonomy, "taxonomy.qza");

    let output = ws
        .cmd()
        .args(["--format", "json", "peek", "taxonomy.qza"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["type"], "FeatureData[Taxonomy]");
    assert_eq!(json["provenance"]["action"], "import");
}

#[test]
fn test_import_rejects_fastq_without_quality_dir() {
    let ws = Workspace::new();
    let fasta = ws.write("refs.fasta", REFERENCE_FASTA);
    ws.cmd()
        .args(["import", "--type", "SampleData[SequencesWithQuality]", "--input-path"])
        .arg(&fasta)
        .args(["--output-path", "reads.qza"])
        .assert()
        .failure();
    assert!(!ws.path("reads.qza").exists());
}

#[test]
fn test_invalid_parameter_fails_before_any_tool_runs() {
    let ws = Workspace::new();
    ws.install_fakes();
    let refs = ws.write("refs.fasta", REFERENCE_FASTA);
    let queries = ws.write("queries.fasta", QUERY_FASTA);
    ws.import("FeatureData[Sequence]", &refs, "refs.qza");
    ws.import("FeatureData[Sequence]", &queries, "queries.qza");

    ws.cmd()
        .args([
            "extract-reads",
            "--i-sequences",
            "queries.qza",
            "--i-reference-reads",
            "refs.qza",
            "--p-min-per-identity=-0.5",
            "--o-extracted-seqs",
            "out.qza",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_per_identity"));

    assert!(!ws.path("tool-ran").exists());
    assert!(!ws.path("out.qza").exists());
    assert!(ws.tmp_is_empty());
}

#[test]
fn test_both_references_rejected() {
    let ws = Workspace::new();
    ws.install_fakes();
    let refs = ws.write("refs.fasta", REFERENCE_FASTA);
    ws.import("FeatureData[Sequence]", &refs, "refs.qza");
    ws.write("index.mmi", "MMI");
    ws.import("Minimap2IndexDB", &ws.path("index.mmi"), "index.qza");

    ws.cmd()
        .args([
            "extract-reads",
            "--i-sequences",
            "refs.qza",
            "--i-reference-reads",
            "refs.qza",
            "--i-index-database",
            "index.qza",
            "--o-extracted-seqs",
            "out.qza",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Exactly one of"));
    assert!(!ws.path("tool-ran").exists());
}

#[test]
fn test_tool_failure_leaves_nothing_behind() {
    let ws = Workspace::new();
    ws.install("minimap2", "echo 'index construction failed' >&2\nexit 3");
    let refs = ws.write("refs.fasta", REFERENCE_FASTA);
    ws.import("FeatureData[Sequence]", &refs, "refs.qza");

    ws.cmd()
        .args([
            "build-index",
            "--i-sequences",
            "refs.qza",
            "--o-index-database",
            "index.qza",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minimap2 failed with exit code 3"))
        .stderr(predicate::str::contains("index construction failed"));

    assert!(!ws.path("index.qza").exists());
    assert!(ws.tmp_is_empty());
}

#[test]
fn test_missing_tool_is_reported() {
    let ws = Workspace::new();
    let refs = ws.write("refs.fasta", REFERENCE_FASTA);
    ws.import("FeatureData[Sequence]", &refs, "refs.qza");

    ws.cmd()
        .args([
            "build-index",
            "--i-sequences",
            "refs.qza",
            "--o-index-database",
            "index.qza",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minimap2 not found"));
    assert!(ws.tmp_is_empty());
}

#[test]
fn test_build_index_then_search() {
    let ws = Workspace::new();
    ws.install_fakes();
    ws.write("search.paf", SEARCH_PAF);
    let refs = ws.write("refs.fasta", REFERENCE_FASTA);
    let queries = ws.write("queries.fasta", ">q1\nACGT\n>q2\nTTTT\n");
    ws.import("FeatureData[Sequence]", &refs, "refs.qza");
    ws.import("FeatureData[Sequence]", &queries, "queries.qza");

    ws.cmd()
        .args([
            "build-index",
            "--i-sequences",
            "refs.qza",
            "--p-kmer-length",
            "19",
            "--o-index-database",
            "index.qza",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved Minimap2IndexDB to: index.qza"));

    let index = Artifact::load(&ws.path("index.qza")).unwrap();
    assert_eq!(index.metadata().provenance.action, "build-index");
    assert_eq!(
        index.metadata().provenance.parameters["kmer_length"],
        serde_json::json!(19)
    );

    ws.cmd()
        .args([
            "search",
            "--i-query-reads",
            "queries.qza",
            "--i-index-database",
            "index.qza",
            "--o-search-results",
            "hits.qza",
        ])
        .assert()
        .success();

    // maxaccepts defaults to 1: one hit for q1 plus the no-hit row for q2
    let hits = payload(&ws.path("hits.qza"), "output.paf");
    let queries: Vec<_> = hits.lines().map(|l| l.split('\t').next().unwrap()).collect();
    assert_eq!(queries, vec!["q1", "q2"]);
    assert!(hits.lines().next().unwrap().contains("\tref1\t"));
    assert!(ws.tmp_is_empty());
}

#[test]
fn test_extract_mapped_and_unmapped_are_disjoint() {
    let ws = Workspace::new();
    ws.install_fakes();
    ws.write("aligned.sam", ALIGNED_SAM);
    let refs = ws.write("refs.fasta", REFERENCE_FASTA);
    let queries = ws.write("queries.fasta", QUERY_FASTA);
    ws.import("FeatureData[Sequence]", &refs, "refs.qza");
    ws.import("FeatureData[Sequence]", &queries, "queries.qza");

    for (selection, output) in [("mapped", "mapped.qza"), ("unmapped", "unmapped.qza")] {
        ws.cmd()
            .args([
                "extract-reads",
                "--i-sequences",
                "queries.qza",
                "--i-reference-reads",
                "refs.qza",
                "--p-extract",
                selection,
                "--p-min-per-identity",
                "0.9",
                "--o-extracted-seqs",
                output,
            ])
            .assert()
            .success();
    }

    assert_eq!(
        payload(&ws.path("mapped.qza"), "dna-sequences.fasta"),
        ">r1\nACGTACGT\n"
    );
    assert_eq!(
        payload(&ws.path("unmapped.qza"), "dna-sequences.fasta"),
        ">r2\nTTTTGGGG\n>r3\nCCCCAAAA\n"
    );
    assert!(ws.tmp_is_empty());
}

/// read1 aligns perfectly, read2 with 2 edits over 8 bases (identity 0.75)
const READS_SAM: &str = "@HD\tVN:1.6\n\
@SQ\tSN:ref1\tLN:10\n\
read1\t0\tref1\t1\t60\t8M\t*\t0\t0\tACGTACGT\tIIIIIIII\tNM:i:0\n\
read2\t0\tref1\t1\t60\t8M\t*\t0\t0\tGGGGCCCC\tIIIIIIII\tNM:i:2\n";

#[test]
fn test_build_index_then_filter_reads_is_reproducible() {
    let ws = Workspace::new();
    ws.install_fakes();
    let sam = ws.write("reads.sam", READS_SAM);
    let refs = ws.write("refs.fasta", REFERENCE_FASTA);
    ws.write("reads/sampleA.fastq", READS_FASTQ);
    ws.import("FeatureData[Sequence]", &refs, "reference.qza");
    ws.import("SampleData[SequencesWithQuality]", &ws.path("reads"), "reads.qza");

    ws.cmd()
        .args([
            "build-index",
            "--i-sequences",
            "reference.qza",
            "--o-index-database",
            "index.qza",
        ])
        .assert()
        .success();

    for output in ["filtered-1.qza", "filtered-2.qza"] {
        ws.cmd()
            .env("FAKE_SAM", &sam)
            .args([
                "filter-reads",
                "--i-query-reads",
                "reads.qza",
                "--i-index-database",
                "index.qza",
                "--p-min-per-identity",
                "0.85",
                "--o-filtered-query-reads",
                output,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Saved SampleData[SequencesWithQuality] to:",
            ));
    }

    let first = Artifact::load(&ws.path("filtered-1.qza")).unwrap();
    let second = Artifact::load(&ws.path("filtered-2.qza")).unwrap();
    assert_eq!(first.signature(), second.signature());

    let reads = longread_qc::formats::fastq::read_fastq(
        &first.data_dir().join("sampleA_0_L001_R1_001.fastq.gz"),
    )
    .unwrap();
    assert_eq!(reads.ids().collect::<Vec<_>>(), vec!["read1"]);
    assert!(ws.tmp_is_empty());
}

const PAIRED_R1: &str = "@good\nACGTACGT\n+\nIIIIIIII\n@weak\nGGGGCCCC\n+\nIIIIIIII\n";
const PAIRED_R2: &str = "@good\nTTTTAAAA\n+\nIIIIIIII\n@weak\nCCCCGGGG\n+\nIIIIIIII\n";

/// Both mates of `good` align perfectly; the reverse mate of `weak` has
/// identity 0.75
const PAIRED_SAM: &str = "@HD\tVN:1.6\n\
@SQ\tSN:ref1\tLN:10\n\
good\t65\tref1\t1\t60\t8M\t*\t0\t0\tACGTACGT\tIIIIIIII\tNM:i:0\n\
good\t129\tref1\t1\t60\t8M\t*\t0\t0\tTTTTAAAA\tIIIIIIII\tNM:i:0\n\
weak\t65\tref1\t1\t60\t8M\t*\t0\t0\tGGGGCCCC\tIIIIIIII\tNM:i:0\n\
weak\t129\tref1\t1\t60\t8M\t*\t0\t0\tCCCCGGGG\tIIIIIIII\tNM:i:2\n";

#[test]
fn test_filter_paired_reads_keeps_mates_together() {
    let ws = Workspace::new();
    ws.install_fakes();
    ws.write("aligned.sam", PAIRED_SAM);
    let refs = ws.write("refs.fasta", REFERENCE_FASTA);
    ws.import("FeatureData[Sequence]", &refs, "reference.qza");
    import_paired(&ws, PAIRED_R1, PAIRED_R2);

    for (keep, output) in [("mapped", "mapped.qza"), ("unmapped", "unmapped.qza")] {
        ws.cmd()
            .args([
                "filter-reads",
                "--i-query-reads",
                "paired.qza",
                "--i-reference-reads",
                "reference.qza",
                "--p-keep",
                keep,
                "--p-min-per-identity",
                "0.85",
                "--o-filtered-query-reads",
                output,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Saved {PAIRED_TYPE} to:")));
    }

    for (output, expected) in [("mapped.qza", "good"), ("unmapped.qza", "weak")] {
        let artifact = ws.path(output);
        assert_eq!(
            Artifact::load(&artifact).unwrap().artifact_type(),
            longread_qc::ArtifactType::PairedEndReads
        );
        assert_eq!(payload(&artifact, "MANIFEST"), PAIRED_MANIFEST);
        let forward = read_ids(&artifact, "S1_0_L001_R1_001.fastq.gz");
        let reverse = read_ids(&artifact, "S1_0_L001_R2_001.fastq.gz");
        assert_eq!(forward, vec![expected]);
        assert_eq!(forward, reverse);
    }
    assert!(ws.tmp_is_empty());
}

#[test]
fn test_find_consensus_annotation() {
    let ws = Workspace::new();
    let paf = ws.write("hits.paf", SEARCH_PAF);
    let taxonomy = ws.write("taxonomy.tsv", REFERENCE_TAXONOMY);
    ws.import("FeatureData[PairwiseAlignmentMN2]", &paf, "hits.qza");
    ws.import("FeatureData[Taxonomy]", &taxonomy, "taxonomy.qza");

    ws.cmd()
        .args([
            "find-consensus-annotation",
            "--i-search-results",
            "hits.qza",
            "--i-reference-taxonomy",
            "taxonomy.qza",
            "--o-consensus-taxonomy",
            "consensus.qza",
        ])
        .assert()
        .success();

    let table = payload(&ws.path("consensus.qza"), "taxonomy.tsv");
    let lines: Vec<_> = table.lines().collect();
    assert_eq!(lines[0], "Feature ID\tTaxon\tConsensus");
    assert_eq!(lines[1], "q1\tk__Bacteria\t1.0");
    assert_eq!(lines[2], "q2\tUnassigned\t1.0");
}

#[test]
fn test_find_consensus_unknown_reference() {
    let ws = Workspace::new();
    let paf = ws.write("hits.paf", SEARCH_PAF);
    let taxonomy = ws.write("taxonomy.tsv", "Feature ID\tTaxon\nref1\tk__Bacteria\n");
    ws.import("FeatureData[PairwiseAlignmentMN2]", &paf, "hits.qza");
    ws.import("FeatureData[Taxonomy]", &taxonomy, "taxonomy.qza");

    ws.cmd()
        .args([
            "find-consensus-annotation",
            "--i-search-results",
            "hits.qza",
            "--i-reference-taxonomy",
            "taxonomy.qza",
            "--o-consensus-taxonomy",
            "consensus.qza",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ref2"));
    assert!(!ws.path("consensus.qza").exists());
}

#[test]
fn test_trim_is_reproducible() {
    let ws = Workspace::new();
    ws.install_fakes();
    ws.write("reads/sampleA.fastq", READS_FASTQ);
    ws.import("SampleData[SequencesWithQuality]", &ws.path("reads"), "reads.qza");

    for output in ["trimmed-1.qza", "trimmed-2.qza"] {
        ws.cmd()
            .args([
                "trim",
                "--i-query-reads",
                "reads.qza",
                "--p-min-length",
                "4",
                "--o-trimmed-query-reads",
                output,
            ])
            .assert()
            .success();
    }

    let first = Artifact::load(&ws.path("trimmed-1.qza")).unwrap();
    let second = Artifact::load(&ws.path("trimmed-2.qza")).unwrap();
    assert_eq!(
        first.artifact_type(),
        longread_qc::ArtifactType::SingleEndReads
    );
    assert_eq!(first.signature(), second.signature());
    assert!(first
        .metadata()
        .checksums
        .contains_key("sampleA_0_L001_R1_001.fastq.gz"));
    assert!(ws.tmp_is_empty());
}

/// chopper stand-in that only applies `--minlength`
const LENGTH_FILTER: &str = r#"if [ "$1" = "--version" ]; then echo chopper 0.9.0; exit 0; fi
min=1
while [ $# -gt 0 ]; do
  case "$1" in
    --minlength) min="$2"; shift ;;
  esac
  shift
done
awk -v min="$min" '
  NR % 4 == 1 { head = $0 }
  NR % 4 == 2 { seq = $0 }
  NR % 4 == 3 { sep = $0 }
  NR % 4 == 0 && length(seq) >= min { print head; print seq; print sep; print $0 }
'"#;

#[test]
fn test_trim_paired_reads_drops_orphaned_mates() {
    let ws = Workspace::new();
    ws.install_fakes();
    ws.install("chopper", LENGTH_FILTER);
    import_paired(
        &ws,
        "@keep\nACGTACGT\n+\nIIIIIIII\n@lose\nGGGGCCCC\n+\nIIIIIIII\n",
        "@keep\nTTTTAAAA\n+\nIIIIIIII\n@lose\nCCG\n+\nIII\n",
    );

    ws.cmd()
        .args([
            "trim",
            "--i-query-reads",
            "paired.qza",
            "--p-min-length",
            "4",
            "--o-trimmed-query-reads",
            "trimmed.qza",
        ])
        .assert()
        .success();

    let trimmed = ws.path("trimmed.qza");
    assert_eq!(
        Artifact::load(&trimmed).unwrap().artifact_type(),
        longread_qc::ArtifactType::PairedEndReads
    );
    assert_eq!(payload(&trimmed, "MANIFEST"), PAIRED_MANIFEST);
    let forward = read_ids(&trimmed, "S1_0_L001_R1_001.fastq.gz");
    let reverse = read_ids(&trimmed, "S1_0_L001_R2_001.fastq.gz");
    assert_eq!(forward, vec!["keep"]);
    assert_eq!(forward, reverse);
    assert!(ws.tmp_is_empty());
}

#[test]
fn test_stats_builds_visualization() {
    let ws = Workspace::new();
    ws.install_fakes();
    ws.write("reads/sampleA.fastq", READS_FASTQ);
    ws.import("SampleData[SequencesWithQuality]", &ws.path("reads"), "reads.qza");

    ws.cmd()
        .args([
            "stats",
            "--i-sequences",
            "reads.qza",
            "--o-visualization",
            "stats.qzv",
        ])
        .assert()
        .success();

    let index = payload(&ws.path("stats.qzv"), "index.html");
    assert!(index.contains("nanoplot_data/NanoPlot-report.html"));
    assert!(ws
        .path("stats.qzv/data/nanoplot_data/NanoStats.txt")
        .is_file());
}

#[test]
fn test_stats_without_report_fails() {
    let ws = Workspace::new();
    ws.install("NanoPlot", "exit 0");
    ws.write("reads/sampleA.fastq", READS_FASTQ);
    ws.import("SampleData[SequencesWithQuality]", &ws.path("reads"), "reads.qza");

    ws.cmd()
        .args([
            "stats",
            "--i-sequences",
            "reads.qza",
            "--o-visualization",
            "stats.qzv",
        ])
        .assert()
        .failure();
    assert!(!ws.path("stats.qzv").exists());
    assert!(ws.tmp_is_empty());
}

#[test]
fn test_actions_list_and_show() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["actions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filter-reads"))
        .stdout(predicate::str::contains("find-consensus-annotation"));

    ws.cmd()
        .args(["actions", "show", "classify-consensus"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--p-min-consensus"))
        .stdout(predicate::str::contains("Float in (0.5, 1]"));

    ws.cmd()
        .args(["actions", "show", "no-such-action"])
        .assert()
        .failure();
}

#[test]
fn test_tools_reports_versions() {
    let ws = Workspace::new();
    ws.install_fakes();
    ws.cmd()
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("2.28-fake"))
        .stdout(predicate::str::contains("NanoPlot 1.43.0"));

    fs::remove_file(ws.path("tools/chopper")).unwrap();
    ws.cmd()
        .arg("tools")
        .assert()
        .failure()
        .stdout(predicate::str::contains("MISSING"));
}
