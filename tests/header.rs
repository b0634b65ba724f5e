use csv_shape::{
    deduplicate, normalize_column, Configuration, Deduplicator, Header, HeaderError,
    HeaderNormalizer, HeaderOptions,
};
use proptest::prelude::*;

fn raw(cells: &[&str]) -> Vec<Option<String>> {
    cells.iter().map(|c| Some(c.to_string())).collect()
}

fn names(header: &Header) -> Vec<&str> {
    header.iter().map(|c| c.as_str()).collect()
}

#[test]
fn normalizes_messy_cells() -> anyhow::Result<()> {
    let cases = [
        ("  First name (user)", "first_name_user"),
        ("E-Mail Address", "e_mail_address"),
        ("Created.At", "created_at"),
        ("amount, usd", "amount_usd"),
        ("user@domain", "user_at_domain"),
        ("path\\to\\thing", "path_to_thing"),
        ("Module::Name", "module_name"),
        ("Price ($)", "price"),
        ("# of items", "of_items"),
        ("a   |  b", "a_b"),
        ("zero\u{200B}width", "zerowidth"),
        ("\u{FEFF}Id", "id"),
        ("__leading and trailing__", "leading_and_trailing"),
        ("Größe", "größe"),
        ("First\tName", "first_name"),
        ("First\nName", "first_name"),
        ("First\r\n Name", "first_name"),
        ("Bell\u{7}Ring", "bellring"),
    ];
    for (input, expected) in cases {
        assert_eq!(normalize_column(Some(input), Some(0))?, expected, "input {input:?}");
    }
    Ok(())
}

#[test]
fn blank_cells_fall_back_to_position() -> anyhow::Result<()> {
    assert_eq!(normalize_column(None, Some(3))?, "column3");
    assert_eq!(normalize_column(Some(""), Some(0))?, "column0");
    assert!(matches!(
        normalize_column(None, None),
        Err(HeaderError::MissingHeaderColumn { index: None })
    ));
    Ok(())
}

proptest! {
    #[test]
    fn normalization_is_idempotent(cell in "(\\PC|[\t\n\r\u{7}\u{200B}]){0,24}") {
        let once = normalize_column(Some(&cell), Some(0)).unwrap();
        prop_assume!(!once.is_empty());
        let twice = normalize_column(Some(&once), Some(0)).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn auto_suffix_output_is_unique(cols in prop::collection::vec("[ab]{1,2}", 0..16)) {
        let out = deduplicate(&cols);
        prop_assert_eq!(out.len(), cols.len());
        let unique: std::collections::HashSet<&String> = out.iter().collect();
        prop_assert_eq!(unique.len(), out.len());
        for (before, after) in cols.iter().zip(&out) {
            prop_assert!(after.starts_with(before.as_str()));
        }
    }

    #[test]
    fn distinct_clean_cells_keep_header_width(cells in prop::collection::hash_set("[a-z][a-z0-9]{0,8}", 1..12)) {
        let cells: Vec<Option<String>> = cells.into_iter().map(Some).collect();
        let width = cells.len();
        let header = Header::new(cells).unwrap();
        prop_assert_eq!(header.len(), width);
    }

    #[test]
    fn serialized_header_reparses_to_same_columns(cells in prop::collection::vec("[A-Za-z ,\"-]{1,10}", 1..8)) {
        let header = match Header::new(cells.into_iter().map(Some).collect()) {
            Ok(header) => header,
            // punctuation-only cells normalize to nothing
            Err(_) => return Ok(()),
        };
        let line = header.to_csv(None).unwrap();
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes());
        let record = rdr.records().next().unwrap().unwrap();
        let reparsed = Header::new(record.iter().map(|c| Some(c.to_string())).collect()).unwrap();
        prop_assert_eq!(names(&reparsed), names(&header));
    }
}

#[test]
fn auto_suffix_keeps_positions() {
    let cols = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert_eq!(deduplicate(&cols(&["id", "id", "name"])), cols(&["id", "id1", "name"]));
    assert_eq!(deduplicate(&cols(&["a", "b", "a", "a"])), cols(&["a", "b", "a1", "a2"]));
    // never collides with a name already present
    assert_eq!(deduplicate(&cols(&["a", "a", "a1"])), cols(&["a", "a2", "a1"]));
}

#[test]
fn raise_reports_duplicates_in_order() {
    let cols = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert!(Deduplicator::Raise.apply(cols(&["id", "name"])).is_ok());
    match Deduplicator::Raise.apply(cols(&["b", "a", "b", "a", "c"])) {
        Err(HeaderError::DuplicateHeaderColumn(dups)) => assert_eq!(dups, cols(&["b", "a"])),
        other => panic!("expected duplicate error, got {other:?}"),
    }
}

#[test]
fn strategy_names_parse() -> anyhow::Result<()> {
    assert_eq!("deduplicate".parse::<Deduplicator>()?.name(), "deduplicate");
    assert_eq!("auto_suffix".parse::<Deduplicator>()?.name(), "deduplicate");
    assert_eq!(" Raise ".parse::<Deduplicator>()?.name(), "raise");
    assert_eq!("none".parse::<Deduplicator>()?.name(), "none");
    assert!(matches!(
        "shuffle".parse::<Deduplicator>(),
        Err(HeaderError::UnknownDeduplicationStrategy(s)) if s == "shuffle"
    ));
    Ok(())
}

#[test]
fn header_keeps_original_and_canonical() -> anyhow::Result<()> {
    let header = Header::new(raw(&["Email", "First Name"]))?;
    assert_eq!(names(&header), ["email", "first_name"]);
    assert_eq!(header.original(), raw(&["Email", "First Name"]).as_slice());
    assert_eq!(header.to_csv(None)?, "email,first_name\n");
    assert_eq!(header.to_csv(Some(&["first_name"]))?, "first_name\n");
    Ok(())
}

#[test]
fn header_rejects_empty_row() {
    assert!(matches!(Header::new(vec![]), Err(HeaderError::MissingHeader)));
}

#[test]
fn header_with_blank_cell_uses_position_by_default() -> anyhow::Result<()> {
    let header = Header::new(vec![Some("Id".into()), None, Some(String::new())])?;
    assert_eq!(names(&header), ["id", "column1", "column2"]);
    Ok(())
}

#[test]
fn custom_normalizer_must_not_return_blank() {
    let options = HeaderOptions {
        normalizer: HeaderNormalizer::single(|cell| cell.unwrap_or_default().to_string()),
        ..Default::default()
    };
    let err = Header::with_options(raw(&["Id", ""]), &options).unwrap_err();
    assert!(matches!(err, HeaderError::MissingHeaderColumn { index: Some(1) }));
    assert!(err.to_string().contains("column 1"));
}

#[test]
fn indexed_and_mapping_normalizers() -> anyhow::Result<()> {
    let options = HeaderOptions {
        normalizer: HeaderNormalizer::indexed(|cell, i| format!("f{i}_{}", cell.unwrap_or("x"))),
        ..Default::default()
    };
    let header = Header::with_options(raw(&["a", "b"]), &options)?;
    assert_eq!(names(&header), ["f0_a", "f1_b"]);

    let upper = HeaderNormalizer::single(|cell| cell.unwrap_or_default().to_uppercase());
    let config = Configuration::new().with_header_normalizer(HeaderNormalizer::mapping([
        ("E-mail", csv_shape::ColumnRename::from("email")),
        ("Code", upper.into()),
    ]));
    let header = Header::with_options(raw(&["E-mail", "Code", "Full Name"]), &config.header)?;
    assert_eq!(names(&header), ["email", "CODE", "full_name"]);
    Ok(())
}

#[test]
fn dedup_strategies_through_configuration() -> anyhow::Result<()> {
    let cells = raw(&["ID", "id"]);

    let header = Header::with_options(cells.clone(), &Configuration::new().header)?;
    assert_eq!(names(&header), ["id", "id1"]);

    let keep = Configuration::new().with_deduplicator(Deduplicator::None);
    assert_eq!(names(&Header::with_options(cells.clone(), &keep.header)?), ["id", "id"]);

    let raise = Configuration::new().with_deduplicator(Deduplicator::Raise);
    assert!(matches!(
        Header::with_options(cells.clone(), &raise.header),
        Err(HeaderError::DuplicateHeaderColumn(_))
    ));

    let custom = Configuration::new().with_deduplicator(Deduplicator::custom(|cols| {
        Ok(cols.into_iter().enumerate().map(|(i, c)| format!("{c}_{i}")).collect())
    }));
    assert_eq!(names(&Header::with_options(cells, &custom.header)?), ["id_0", "id_1"]);
    Ok(())
}

#[test]
fn custom_dedup_must_keep_every_column() {
    let dropping = Configuration::new().with_deduplicator(Deduplicator::custom(|cols| {
        Ok(cols.into_iter().take(1).collect())
    }));
    match Header::with_options(raw(&["a", "b"]), &dropping.header) {
        Err(HeaderError::DeduplicatedLength { expected, actual }) => {
            assert_eq!((expected, actual), (2, 1))
        }
        other => panic!("expected length error, got {other:?}"),
    }

    let padding = Configuration::new().with_deduplicator(Deduplicator::custom(|mut cols| {
        cols.push("extra".into());
        Ok(cols)
    }));
    assert!(matches!(
        Header::with_options(raw(&["a"]), &padding.header),
        Err(HeaderError::DeduplicatedLength { expected: 1, actual: 2 })
    ));
}

#[test]
fn valid_columns_allow_list() -> anyhow::Result<()> {
    let config = Configuration::new().with_valid_columns(["id", "name"]);
    assert!(Header::with_options(raw(&["Id", "Name"]), &config.header).is_ok());
    match Header::with_options(raw(&["Id", "Age"]), &config.header) {
        Err(HeaderError::UnknownHeaderColumn(column)) => assert_eq!(column, "age"),
        other => panic!("expected unknown column, got {other:?}"),
    }
    Ok(())
}
