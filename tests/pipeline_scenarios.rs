use std::fs;
use std::io::Write;
use std::path::PathBuf;

use approx::assert_relative_eq;
use deckstats::data::{text_cells, DataLoader, LoadError, PRICE_COL, RANK_COL};
use deckstats::stats::AnalysisError;
use deckstats::{analyze, load, DeckSnapshot};
use polars::prelude::*;
use tempfile::TempDir;

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn floats(df: &DataFrame, column: &str) -> Vec<f64> {
    df.column(column)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.expect("coerced column has no nulls"))
        .collect()
}

fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    text_cells(df.column(column).unwrap()).unwrap()
}

const BOLT_GOBLIN: &str = "\
deck,name,type,price_usd,commander,color,edhrec_rank
D1,Bolt,Instant,2.50,0,R,100
D1,Goblin,Creature,1.00,1,R,50
";

#[test]
fn bolt_and_goblin_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "decks.csv", BOLT_GOBLIN);

    let decks = load(&path).unwrap();
    let bundle = analyze(&decks.full, &decks.non_land, &[]).unwrap();

    assert_eq!(bundle.distinct_deck_count, 1);
    assert_eq!(bundle.price_by_deck.len(), 1);
    assert_relative_eq!(bundle.price_by_deck.get("D1").unwrap(), 3.50);
    assert_eq!(bundle.commander_colors.len(), 1);
    assert_eq!(bundle.commander_colors.get("R"), Some(1));
    assert_relative_eq!(bundle.popularity_by_deck.get("D1").unwrap(), 1.50);
    assert_eq!(bundle.common_cards.labels(), vec!["Bolt", "Goblin"]);
    assert_eq!(bundle.common_cards.get("Bolt"), Some(1));
    assert_eq!(bundle.common_cards.get("Goblin"), Some(1));
}

#[test]
fn original_headers_are_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "todos_os_decks.csv",
        "\
 Deck ,Nome,Custo,Preco_USD,EDHREC_Rank,Cor,Tipo,Comandante
Atraxa,Atraxa,4,30.00,12,WUBG,Legendary Creature,1
Atraxa,Command Tower,0,0.25,1,,Land,0
",
    );

    let decks = load(&path).unwrap();
    let names: Vec<String> = decks
        .full
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        names,
        vec!["deck", "name", "cost", "price_usd", "edhrec_rank", "color", "type", "commander"]
    );
    assert_eq!(decks.non_land.height(), 1);

    let bundle = analyze(&decks.full, &decks.non_land, &labels(&["Land"])).unwrap();
    assert_eq!(bundle.commander_colors.get("WUBG"), Some(1));
    assert_eq!(
        bundle.cards_of_type("Land").unwrap().get("Command Tower"),
        Some(1)
    );
}

#[test]
fn invalid_decks_never_survive_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
Good,Sol Ring,Artifact,1.0,0,,1
Bad_INVALIDO,Sol Ring,Artifact,1.0,0,,1
INVALIDO_prefix,Arcane Signet,Artifact,1.0,0,,1
,Orphan,Artifact,1.0,0,,1
",
    );

    let decks = load(&path).unwrap();
    let deck_names = strings(&decks.full, "deck");
    assert_eq!(
        deck_names,
        vec![
            Some("Good".to_string()),
            Some("INVALIDO_prefix".to_string()),
            None
        ]
    );
    assert!(deck_names
        .iter()
        .flatten()
        .all(|d| !d.ends_with("INVALIDO")));

    let bundle = analyze(&decks.full, &decks.non_land, &[]).unwrap();
    assert_eq!(bundle.distinct_deck_count, 2);
    assert_eq!(bundle.common_cards.get("Orphan"), None);
}

#[test]
fn clean_table_round_trips_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "decks.csv", BOLT_GOBLIN);

    let decks = load(&path).unwrap();
    assert_eq!(decks.full.height(), 2);
    assert_eq!(
        strings(&decks.full, "name"),
        vec![Some("Bolt".to_string()), Some("Goblin".to_string())]
    );
    assert_eq!(floats(&decks.full, PRICE_COL), vec![2.5, 1.0]);
    assert_eq!(floats(&decks.full, RANK_COL), vec![100.0, 50.0]);
}

#[test]
fn malformed_numbers_load_as_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
A,Sol Ring,Artifact,abc,0,,n/a
A,Arcane Signet,Artifact,,0,,7
",
    );

    let decks = load(&path).unwrap();
    assert_eq!(floats(&decks.full, PRICE_COL), vec![0.0, 0.0]);
    assert_eq!(floats(&decks.full, RANK_COL), vec![0.0, 7.0]);
}

#[test]
fn missing_numeric_columns_default_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "deck,name,type,commander,color\nA,Sol Ring,Artifact,1,C\n",
    );

    let decks = load(&path).unwrap();
    assert_eq!(floats(&decks.full, PRICE_COL), vec![0.0]);
    let bundle = analyze(&decks.full, &decks.non_land, &[]).unwrap();
    assert!(bundle.price_by_deck.is_empty());
    assert!(bundle.popularity_by_deck.is_empty());
    assert_eq!(bundle.commander_colors.get("C"), Some(1));
}

#[test]
fn non_land_subset_excludes_lands_by_substring() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
A,Gaea's Cradle,Legendary Land,500,0,,3
A,Dryad Arbor,Land Creature,1,0,G,40
A,Llanowar Elves,Creature,0.5,0,G,2
A,Mystery,,0.1,0,,9
",
    );

    let decks = load(&path).unwrap();
    assert_eq!(
        strings(&decks.non_land, "name"),
        vec![
            Some("Llanowar Elves".to_string()),
            Some("Mystery".to_string())
        ]
    );
    assert!(decks.non_land.height() <= decks.full.height());
}

#[test]
fn price_totals_at_or_below_zero_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
A,Card1,Instant,5.0,0,,1
B,Card2,Instant,0.0,0,,1
C,Card3,Instant,-1.0,0,,1
",
    );

    let decks = load(&path).unwrap();
    let bundle = analyze(&decks.full, &decks.non_land, &[]).unwrap();
    assert_eq!(bundle.price_by_deck.labels(), vec!["A"]);
    assert_relative_eq!(bundle.price_by_deck.get("A").unwrap(), 5.0);
}

#[test]
fn first_commander_row_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
A,Partner One,Legendary Creature,1,1,W,1
A,Partner Two,Legendary Creature,1,1,B,1
B,Solo,Legendary Creature,1,True,B,1
",
    );

    let decks = load(&path).unwrap();
    let bundle = analyze(&decks.full, &decks.non_land, &[]).unwrap();
    assert_eq!(bundle.commander_colors.get("W"), Some(1));
    assert_eq!(bundle.commander_colors.get("B"), Some(1));
    assert_eq!(bundle.commander_colors.len(), 2);
}

#[test]
fn numeric_commander_flags_in_any_spelling() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
A,X,Creature,1,1.00,R,1
B,Y,Creature,1,01,G,1
C,Z,Creature,1,0.0,U,1
",
    );

    let decks = load(&path).unwrap();
    let bundle = analyze(&decks.full, &decks.non_land, &[]).unwrap();
    assert_eq!(bundle.commander_colors.labels(), vec!["R", "G"]);
    assert_eq!(bundle.commander_colors.get("R"), Some(1));
    assert_eq!(bundle.commander_colors.get("G"), Some(1));
}

#[test]
fn artifact_creature_lands_in_both_buckets() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
A,Solemn Simulacrum,Artifact Creature,1,0,,1
",
    );

    let decks = load(&path).unwrap();
    let bundle = analyze(
        &decks.full,
        &decks.non_land,
        &labels(&["Creature", "Artifact", "Sorcery"]),
    )
    .unwrap();
    assert_eq!(
        bundle.cards_of_type("Creature").unwrap().get("Solemn Simulacrum"),
        Some(1)
    );
    assert_eq!(
        bundle.cards_of_type("Artifact").unwrap().get("Solemn Simulacrum"),
        Some(1)
    );
    assert!(bundle.cards_of_type("Sorcery").unwrap().is_empty());
}

#[test]
fn empty_table_yields_empty_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "deck,name,type,price_usd,commander,color,edhrec_rank\n",
    );

    let decks = load(&path).unwrap();
    assert_eq!(decks.full.height(), 0);
    let bundle = analyze(&decks.full, &decks.non_land, &labels(&["Land", "Creature"])).unwrap();
    assert_eq!(bundle.distinct_deck_count, 0);
    assert!(bundle.price_by_deck.is_empty());
    assert!(bundle.commander_colors.is_empty());
    assert!(bundle.common_cards.is_empty());
    assert!(bundle.popularity_by_deck.is_empty());
    assert_eq!(bundle.cards_by_type.len(), 2);
    assert!(bundle.cards_by_type.iter().all(|t| t.cards.is_empty()));
}

#[test]
fn popularity_sums_raw_ranks_descending() {
    // Higher raw EDHREC ranks mean less popular cards, yet they sort first here
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
Staples,Sol Ring,Artifact,1,0,,1
Staples,Arcane Signet,Artifact,1,0,,2
Jank,Obscure Card,Creature,1,0,,25000
",
    );

    let decks = load(&path).unwrap();
    let bundle = analyze(&decks.full, &decks.non_land, &[]).unwrap();
    assert_eq!(bundle.popularity_by_deck.labels(), vec!["Jank", "Staples"]);
    assert_relative_eq!(bundle.popularity_by_deck.get("Staples").unwrap(), 0.03);
}

#[test]
fn ties_keep_first_seen_deck_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "\
deck,name,type,price_usd,commander,color,edhrec_rank
Zeta,A,Instant,2,0,,1
Alpha,B,Instant,2,0,,1
Mid,C,Instant,3,0,,1
",
    );

    let decks = load(&path).unwrap();
    let bundle = analyze(&decks.full, &decks.non_land, &[]).unwrap();
    assert_eq!(bundle.price_by_deck.labels(), vec!["Mid", "Zeta", "Alpha"]);
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "decks.csv", BOLT_GOBLIN);
    let types = labels(&["Instant", "Creature"]);

    let first = load(&path).unwrap();
    let second = load(&path).unwrap();
    let a = analyze(&first.full, &first.non_land, &types).unwrap();
    let b = analyze(&second.full, &second.non_land, &types).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));
}

#[test]
fn table_without_deck_column_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "decks.csv", "name,type\nSol Ring,Artifact\n");
    let err = load(&path).unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn("deck")));
}

#[test]
fn missing_analysis_field_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "deck,name,type,price_usd\nA,Sol Ring,Artifact,1\n",
    );
    let decks = load(&path).unwrap();
    let err = analyze(&decks.full, &decks.non_land, &[]).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::MissingField {
            field: "commander",
            ..
        }
    ));
}

#[test]
fn semicolon_separated_files_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "decks.csv",
        "deck;name;type;price_usd;commander;color;edhrec_rank\nA;Sol Ring;Artifact;1.5;1;C;1\n",
    );
    let decks = DataLoader::new().with_separator(b';').load(&path).unwrap();
    assert_eq!(floats(&decks.full, PRICE_COL), vec![1.5]);
}

#[test]
fn snapshot_reload_picks_up_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "decks.csv", BOLT_GOBLIN);

    let mut snapshot = DeckSnapshot::load(&path, labels(&["Instant"])).unwrap();
    assert_eq!(snapshot.bundle().distinct_deck_count, 1);
    let before = snapshot.clone();

    write_csv(
        &dir,
        "decks.csv",
        &format!("{BOLT_GOBLIN}D2,Bolt,Instant,2.50,1,R,100\n"),
    );
    snapshot.reload().unwrap();

    assert_eq!(snapshot.bundle().distinct_deck_count, 2);
    assert_eq!(before.bundle().distinct_deck_count, 1);
    assert_eq!(
        snapshot.bundle().cards_of_type("Instant").unwrap().get("Bolt"),
        Some(2)
    );
}

#[test]
fn failed_reload_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "decks.csv", BOLT_GOBLIN);

    let mut snapshot = DeckSnapshot::load(&path, Vec::new()).unwrap();
    fs::remove_file(&path).unwrap();

    assert!(snapshot.reload().is_err());
    assert_eq!(snapshot.bundle().distinct_deck_count, 1);
}
