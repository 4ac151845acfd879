use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use huella_game::{
    ChallengeCatalog, DailyChallenge, DailyError, JsonFileStorage, MemoryStorage, Position,
    ProgressStorage, ProgressStore, hide_target, play_round,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "huella-props-{label}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn random_sessions_keep_totals_monotonic_and_one_entry_per_day() {
    let catalog = ChallengeCatalog::default_catalog();
    for seed in [1_u64, 7, 42, 1337] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut store = ProgressStore::open(MemoryStorage::new()).unwrap();
        let mut attempted_days = BTreeSet::new();
        let mut last_points = 0;
        let mut last_co2 = 0.0;

        for step in 0..200_u64 {
            // several commands land on the same day
            let today = start_date() + Days::new(step / 3);
            match DailyChallenge::offer(&store, &catalog, today, &mut rng) {
                Ok(challenge) => {
                    let challenge = challenge.clone();
                    let completed = rng.gen_bool(0.5);
                    DailyChallenge::resolve(&mut store, today, &challenge, completed).unwrap();
                    attempted_days.insert(today);
                    let target = hide_target(&mut rng);
                    let guess = Some(hide_target(&mut rng));
                    play_round(&mut store, target, guess).unwrap();
                }
                Err(DailyError::AlreadyAttempted { date }) => assert_eq!(date, today),
                Err(other) => panic!("unexpected error: {other}"),
            }

            let record = store.record();
            assert!(record.points() >= last_points);
            assert!(record.co2_total() >= last_co2);
            last_points = record.points();
            last_co2 = record.co2_total();
        }

        let record = store.record();
        assert_eq!(record.history().len(), attempted_days.len());
        let dates: BTreeSet<_> = record.history().iter().map(|e| e.date).collect();
        assert_eq!(dates, attempted_days);
    }
}

#[test]
fn repeat_attempt_today_leaves_file_untouched() {
    let dir = temp_dir("idempotent");
    let storage = JsonFileStorage::new(dir.join("progreso.json"));
    let catalog = ChallengeCatalog::default_catalog();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let today = start_date();

    let mut store = ProgressStore::open(storage.clone()).unwrap();
    let challenge = DailyChallenge::offer(&store, &catalog, today, &mut rng)
        .unwrap()
        .clone();
    DailyChallenge::resolve(&mut store, today, &challenge, true).unwrap();
    let saved = fs::read(storage.path()).unwrap();

    let mut reopened = ProgressStore::open(storage.clone()).unwrap();
    assert!(DailyChallenge::offer(&reopened, &catalog, today, &mut rng).is_err());
    assert!(DailyChallenge::resolve(&mut reopened, today, &challenge, false).is_err());
    assert_eq!(fs::read(storage.path()).unwrap(), saved);
    assert_eq!(reopened.record().history().len(), 1);
    fs::remove_dir_all(dir).ok();
}

#[test]
fn any_subset_of_missing_fields_is_backfilled() {
    let full = [
        ("nombre", r#""Ana""#),
        ("puntos", "12"),
        ("co2_total", "1.2"),
        (
            "historial",
            r#"[{"fecha": "2024-01-01", "reto": "Recicla", "co2": 0.8, "cumplido": false}]"#,
        ),
        ("ciudad", r#""Lima""#),
    ];
    for mask in 0_u32..32 {
        let fields: Vec<String> = full
            .iter()
            .enumerate()
            .filter(|(idx, _)| mask & (1 << idx) != 0)
            .map(|(_, (key, value))| format!("\"{key}\": {value}"))
            .collect();
        let json = format!("{{{}}}", fields.join(", "));
        let store = ProgressStore::open(MemoryStorage::with_contents(json.clone()))
            .unwrap_or_else(|err| panic!("{json}: {err}"));
        let record = store.record();

        let has = |idx: usize| mask & (1 << idx) != 0;
        assert_eq!(record.name(), has(0).then_some("Ana"));
        assert_eq!(record.points(), if has(1) { 12 } else { 0 });
        let co2 = if has(2) { 1.2 } else { 0.0 };
        assert!((record.co2_total() - co2).abs() < 1e-9);
        assert_eq!(record.history().len(), usize::from(has(3)));
        assert_eq!(record.city(), has(4).then_some("Lima"));
    }
}

#[test]
fn save_of_load_is_byte_stable() -> anyhow::Result<()> {
    let dir = temp_dir("roundtrip");
    let path = dir.join("progreso.json");
    // legacy file as the original program wrote it
    fs::write(
        &path,
        r#"{"nombre": "Ana", "puntos": 26, "co2_total": 2.6, "historial": [{"fecha": "2024-03-02", "reto": "Usa la bicicleta en lugar del auto", "co2": 2.1, "cumplido": true}], "ciudad": null}"#,
    )?;
    let storage = JsonFileStorage::new(&path);

    let first = storage.load()?.expect("record present");
    storage.save(&first)?;
    let after_first = fs::read(&path)?;

    let second = storage.load()?.expect("record present");
    assert_eq!(first, second);
    storage.save(&second)?;
    assert_eq!(fs::read(&path)?, after_first);

    fs::remove_dir_all(dir).ok();
    Ok(())
}

#[test]
fn minigame_hit_and_miss_payouts() {
    let mut store = ProgressStore::open(MemoryStorage::new()).unwrap();
    let hit = play_round(&mut store, Position::Center, Some(Position::Center)).unwrap();
    let miss = play_round(&mut store, Position::Center, Some(Position::Right)).unwrap();
    let garbled = play_round(&mut store, Position::Center, None).unwrap();

    assert_eq!((hit.points_awarded, miss.points_awarded), (5, 0));
    assert_eq!(garbled.points_awarded, 0);
    assert_eq!(store.record().points(), 5);
    assert!((store.record().co2_total() - 0.5).abs() < 1e-9);
}
