use serde_json::json;
use tambo_db::{
    DbError, EntityKind, Farm, FarmId, FormData, Herd, Record, RecordId, Surface, TamboDb,
    Transport,
};
use tempfile::TempDir;

fn farm(name: &str) -> Record {
    Record::Farm(Farm {
        name: name.to_string(),
        city: "Esperanza".to_string(),
        breed: "Holando".to_string(),
        year: 2024,
        month: "Marzo".to_string(),
        total_area: 250.0,
        total_cows_area: 180.0,
        production_per_cow: 24.5,
        milking_cows: 320,
        industry_sales_percentage: 60.0,
        cheese_usage_percentage: 30.0,
        discard_percentage: 10.0,
        protein_percentage: 3.4,
        fat_percentage: 3.7,
    })
}

fn herd(category: &str, count: i64) -> Record {
    Record::Herd(Herd {
        category: category.to_string(),
        animal_count: count,
        average_weight: 550.0,
        grazing_hours: 8,
        dry_matter_diet: 18.0,
        pasture_percentage: 50,
        concentrate_percentage: 30,
        others_percentage: 20,
    })
}

#[tokio::test]
async fn test_get_on_empty_store_returns_nothing() {
    let db = TamboDb::open_in_memory().await.unwrap();

    for kind in EntityKind::ALL {
        assert!(db.get(kind, None).await.unwrap().is_empty());
    }
    assert!(!db.exists_any().await.unwrap());
    assert_eq!(db.latest_farm().await.unwrap(), None);
    assert!(db.snapshot(None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_twice_leaves_one_row_with_second_values() {
    let db = TamboDb::open_in_memory().await.unwrap();
    let f = db.upsert(&farm("La Esperanza"), None, None).await.unwrap();

    let id = RecordId::new();
    let first = db.upsert(&herd("Vacas en ordeñe", 100), Some(&id), None).await.unwrap();
    let second = db.upsert(&herd("Vacas secas", 40), Some(&id), None).await.unwrap();

    assert!(first.is_new);
    assert!(!second.is_new);
    assert_eq!(first.id, second.id);

    let rows = db.get(EntityKind::Herd, Some(&f.farm_id)).await.unwrap();
    assert_eq!(rows.len(), 1);
    let stored = rows[0].record.as_herd().unwrap();
    assert_eq!(stored.category, "Vacas secas");
    assert_eq!(stored.animal_count, 40);
}

#[tokio::test]
async fn test_upsert_by_differently_spelled_uuid_hits_same_row() {
    let db = TamboDb::open_in_memory().await.unwrap();
    db.upsert(&farm("La Esperanza"), None, None).await.unwrap();

    let id = RecordId::new();
    let upper = RecordId::parse(&id.as_str().to_uppercase()).unwrap();
    let braced = RecordId::parse(&format!("{{{}}}", id)).unwrap();

    db.upsert(&herd("Vacas en ordeñe", 100), Some(&id), None).await.unwrap();
    let second = db.upsert(&herd("Vacas secas", 40), Some(&upper), None).await.unwrap();
    let third = db.upsert(&herd("Vaquillonas", 25), Some(&braced), None).await.unwrap();

    assert!(!second.is_new);
    assert!(!third.is_new);
    assert_eq!(third.id, id);
    assert_eq!(db.count(EntityKind::Herd, None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_child_defaults_to_latest_farm() {
    let db = TamboDb::open_in_memory().await.unwrap();
    let older = db.upsert(&farm("Primero"), None, None).await.unwrap();
    let newer = db.upsert(&farm("Segundo"), None, None).await.unwrap();

    let outcome = db.upsert(&herd("Terneros", 12), None, None).await.unwrap();
    assert_eq!(outcome.farm_id, newer.farm_id);

    assert_eq!(db.count(EntityKind::Herd, Some(&newer.farm_id)).await.unwrap(), 1);
    assert_eq!(db.count(EntityKind::Herd, Some(&older.farm_id)).await.unwrap(), 0);

    // reads follow the same default
    let rows = db.get(EntityKind::Herd, None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].farm_id.as_ref(), Some(&newer.farm_id));
}

#[tokio::test]
async fn test_explicit_parent_overrides_default() {
    let db = TamboDb::open_in_memory().await.unwrap();
    let older = db.upsert(&farm("Primero"), None, None).await.unwrap();
    db.upsert(&farm("Segundo"), None, None).await.unwrap();

    let outcome = db
        .upsert(&herd("Vaquillonas", 30), None, Some(&older.farm_id))
        .await
        .unwrap();
    assert_eq!(outcome.farm_id, older.farm_id);
}

#[tokio::test]
async fn test_missing_parent_writes_nothing() {
    let db = TamboDb::open_in_memory().await.unwrap();

    let err = db
        .upsert(&herd("Vacas", 1), None, Some(&FarmId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::MissingParent(_)));

    let err = db.upsert(&herd("Vacas", 1), None, None).await.unwrap_err();
    assert!(matches!(err, DbError::NoFarm));
    assert_eq!(db.count(EntityKind::Herd, None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_last_removes_exactly_the_newest_row() {
    let db = TamboDb::open_in_memory().await.unwrap();
    assert!(!db.delete_last(EntityKind::Herd).await.unwrap());

    db.upsert(&farm("La Esperanza"), None, None).await.unwrap();
    db.upsert(&herd("A", 1), None, None).await.unwrap();
    db.upsert(&herd("B", 2), None, None).await.unwrap();
    db.upsert(&herd("C", 3), None, None).await.unwrap();

    assert!(db.delete_last(EntityKind::Herd).await.unwrap());

    let remaining: Vec<String> = db
        .get(EntityKind::Herd, None)
        .await
        .unwrap()
        .iter()
        .map(|r| r.record.as_herd().unwrap().category.clone())
        .collect();
    assert_eq!(remaining, vec!["A", "B"]);
}

#[tokio::test]
async fn test_delete_last_on_empty_table_changes_nothing() {
    let db = TamboDb::open_in_memory().await.unwrap();
    db.upsert(&farm("La Esperanza"), None, None).await.unwrap();

    assert!(!db.delete_last(EntityKind::Transport).await.unwrap());
    assert_eq!(db.count(EntityKind::Farm, None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_round_trip_preserves_every_field() {
    let db = TamboDb::open_in_memory().await.unwrap();
    let original = farm("La Esperanza");
    let f = db.upsert(&original, None, None).await.unwrap();

    let surface = Record::Surface(Surface {
        crop: "Alfalfa".to_string(),
        season: "Invierno".to_string(),
        hectares: 42.5,
        green_matter_productivity: 12000.0,
        waste_generated: 1.5,
        waste_destination: "Compost".to_string(),
    });
    let transport = Record::Transport(Transport {
        transported_product: "Leche".to_string(),
        origin: "Tambo".to_string(),
        destination: "Usina".to_string(),
        distance_km: 35.0,
        vehicle_type: "Camión cisterna".to_string(),
        frequency: "Diaria".to_string(),
        fuel_type: "Diesel".to_string(),
        average_load: 18.0,
    });
    db.upsert(&surface, None, None).await.unwrap();
    db.upsert(&transport, None, None).await.unwrap();

    let snapshot = db.snapshot(Some(&f.farm_id)).await.unwrap().unwrap();
    assert_eq!(snapshot.farm.record, original);
    assert_eq!(snapshot.section(EntityKind::Surface)[0].record, surface);
    assert_eq!(snapshot.section(EntityKind::Transport)[0].record, transport);
    assert_eq!(snapshot.sections.len(), EntityKind::CHILDREN.len());
    assert!(snapshot.section(EntityKind::Energy).is_empty());
}

#[tokio::test]
async fn test_form_submission_round_trip() {
    let db = TamboDb::open_in_memory().await.unwrap();
    db.upsert(&farm("La Esperanza"), None, None).await.unwrap();

    let form: FormData = [
        ("tipo_labranza", json!("Siembra directa")),
        ("proporción_cobertura", json!("70")),
        ("proporción_suelo_sin_cobertura", json!(30)),
        ("manejo_suelos_cambios", json!("Sí")),
        ("año_cambio_manejo", json!("")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let record = Record::from_form(EntityKind::Management, &form).unwrap();
    let outcome = db.upsert(&record, None, None).await.unwrap();

    let stored = db
        .get_by_id(EntityKind::Management, &outcome.id)
        .await
        .unwrap()
        .unwrap();
    let back = stored.to_form();
    assert_eq!(back["proporción_cobertura"], json!(70));
    assert_eq!(back["año_cambio_manejo"], serde_json::Value::Null);
    assert_eq!(back["uuid"], json!(outcome.id.as_str()));
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tambo.sqlite3");

    let farm_id = {
        let db = TamboDb::open(&path).await.unwrap();
        let f = db.upsert(&farm("La Esperanza"), None, None).await.unwrap();
        db.upsert(&herd("Vacas", 100), None, None).await.unwrap();
        db.close().await;
        f.farm_id
    };

    let db = TamboDb::open(&path).await.unwrap();
    assert_eq!(db.latest_farm().await.unwrap(), Some(farm_id.clone()));
    assert_eq!(db.count(EntityKind::Herd, Some(&farm_id)).await.unwrap(), 1);
}
