//! JSON configuration and Markov table persistence.
#![cfg(feature = "serde")]

use curio_core::policy::{MarkovMind, MarkovUpdate, PolicyKind};
use curio_core::sensor::ReducerKind;
use curio_core::snapshot::MarkovSnapshot;
use curio_core::CurioConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_partial_json_config_fills_defaults() {
    let config = CurioConfig::from_json_str(r#"{"control": {"period_ms": 100, "enable_light": true}}"#).unwrap();
    assert_eq!(config.control.period_ms, 100);
    assert!(config.control.enable_light);
    assert_eq!(config.control.speed, 0.2);
    assert_eq!(config.sensor.reducer, ReducerKind::Entropy);
    assert_eq!(
        config.policy.kind,
        PolicyKind::Markov3 {
            update: MarkovUpdate::Complement
        }
    );
    assert_eq!(config.sim.iterations, 1024);
}

#[test]
fn test_invalid_json_config_is_rejected() {
    assert!(CurioConfig::from_json_str("{not json").is_err());
    assert!(CurioConfig::from_json_str(r#"{"control": {"speed_min": 0.5, "speed_max": 0.1}}"#).is_err());
}

#[test]
fn test_restored_mind_continues_like_the_original() {
    let mut feed = StdRng::seed_from_u64(40);
    let novelty: Vec<f64> = (0..300).map(|_| feed.gen_range(0.0..20.0)).collect();
    let (warmup, rest) = novelty.split_at(200);

    let mut rng = StdRng::seed_from_u64(41);
    let mut mind = MarkovMind::<3>::new(5).with_update(MarkovUpdate::Bonus { amount: 0.1 });
    for n in warmup {
        mind.step(&mut rng, *n);
    }

    let json = serde_json::to_string(&MarkovSnapshot::from_mind(&mind)).unwrap();
    let snapshot: MarkovSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.context_count(), mind.table_len());
    let mut restored: MarkovMind<3> = snapshot.restore().unwrap();

    let mut rng_restored = rng.clone();
    for n in rest {
        assert_eq!(mind.step(&mut rng, *n), restored.step(&mut rng_restored, *n));
    }
    assert_eq!(mind.context(), restored.context());
}

