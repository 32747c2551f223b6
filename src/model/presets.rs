// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Federation Simulation Suite - Model Presets

//! The three shipped node models.
//!
//! * `federation`: a compressed node for network runs. Ecology, capability
//!   dimensions, governance and sovereignty, with flow inputs wired into the
//!   derivatives.
//! * `integrated`: the fully coupled single-node model. Forty-one variables
//!   covering ecology, five knowledge modes, intergenerational participation,
//!   AI oversight, governance and practice alignment.
//! * `seeded`: a network node hosting its own seed AI. Suggestions land no
//!   faster than the community can assimilate them, and the seed decays once
//!   the node has been cut off for long enough.
//!
//! Coefficients are tunable defaults, not calibrated measurements.

use super::expr::{
    above, aggregate, composite, delayed, geo, health, inflow, isolated_for, logistic, min_of,
    outflow, pos, stress, var, Expr,
};
use super::{FlowBindings, LagSeed, Model, ModelBuilder, SynergyPair};
use crate::error::{ConfigError, Result};
use crate::health::Critical;
use crate::state::{Bounds, InitSpec};
use crate::types::{AggregateMetric as A, FlowKind as F, Profile, StressKind as S};

pub const FEDERATION: &str = "federation";
pub const INTEGRATED: &str = "integrated";
pub const SEEDED: &str = "seeded";

/// Delay between ecological condition and relational-knowledge response.
const ECOLOGY_LAG: usize = 20;
/// Delay between core knowledge and its effect on dissent.
const KNOWLEDGE_LAG: usize = 30;
const KNOWLEDGE_LAG_SEED: f64 = 0.68;

pub fn by_name(name: &str) -> Result<Model> {
    match name.trim().to_ascii_lowercase().as_str() {
        FEDERATION => federation(),
        INTEGRATED | "coupled" => integrated(),
        SEEDED | "emergent" => seeded(),
        _ => Err(ConfigError::UnknownModel(name.to_string())),
    }
}

// ─── Federation ──────────────────────────────────────────────────────────────

pub fn federation() -> Result<Model> {
    let mut m = ModelBuilder::new(FEDERATION);
    let soil = m.unit("soil_carbon", InitSpec::varied(0.85, 1.0));
    let bio = m.unit("biodiversity", InitSpec::varied(0.80, 1.0));
    let water = m.unit("water_retention", InitSpec::varied(0.75, 1.0));
    let know = m.unit("knowledge", InitSpec::varied(0.70, 1.0));
    let gov = m.unit("governance", InitSpec::varied(0.72, 1.0));
    let align = m.unit("alignment", InitSpec::varied(0.65, 1.0));
    let ai = m.unit("ai_symbiosis", InitSpec::fixed(0.75));
    let food = m.unit("food_security", InitSpec::fixed(0.72));
    let energy = m.unit("energy_surplus", InitSpec::fixed(0.60));
    let pop = m.var("population", Bounds::new(0.0, 2.0), InitSpec::fixed(1.0));
    let kk = m.unit("k_kinesthetic", InitSpec::varied(0.70, 4.0 / 3.0));
    let kt = m.unit("k_temporal", InitSpec::varied(0.65, 4.0 / 3.0));
    let kr = m.unit("k_relational", InitSpec::fixed(0.70));
    let kw = m.unit("k_wisdom", InitSpec::fixed(0.62));
    let kd = m.unit("k_digital", InitSpec::fixed(0.70));
    let sov = m.unit("sovereignty_intact", InitSpec::fixed(0.90));
    let pc = m.unit("power_concentration", InitSpec::fixed(0.22));
    let assim = m.unit("assimilation_cap", InitSpec::fixed(0.60));
    let cascade = m.unit("cascade_risk", InitSpec::fixed(0.15));

    let ecology = m.composite("ecology", geo(vec![var(soil), var(bio), var(water)]));
    let integrity = m.composite(
        "governance_integrity",
        geo(vec![var(gov), var(sov), 1.0 - var(pc)]),
    );
    let capability = m.composite(
        "capability",
        geo(vec![var(kk), var(kt), var(kr), var(kw)]),
    );
    let ecology_lag = m.lag("ecology_delayed", ecology, ECOLOGY_LAG, LagSeed::Initial);

    let e = || composite(ecology);
    let ed = || delayed(ecology_lag);
    let p = || stress(S::Pressure);
    let drought = || stress(S::Drought);
    let ego = || stress(S::EgoCapture);
    let empire = || stress(S::EmpirePressure);
    let aic = || stress(S::AiCorruption);
    let kin = || inflow(F::Knowledge);
    let ein = || inflow(F::Ecological);
    let mig_in = || inflow(F::Migration);

    m.rate(
        soil,
        0.03 * e() * (1.0 - var(soil)) - 0.05 * p() - 0.08 * drought() - 0.5 * ein(),
    );
    m.rate(bio, 0.04 * e() * (1.0 - var(bio)) - 0.06 * p() - 0.5 * ein());
    m.rate(
        water,
        0.03 * (1.0 - var(water)) - 0.04 * p() - 0.10 * drought() - ein(),
    );
    m.rate(
        know,
        0.05 * composite(integrity) * logistic(know) + 0.5 * kin() * (1.0 - var(know))
            - 0.08 * p()
            - 0.03 * (1.0 - var(align)) * var(know),
    );
    m.rate(
        gov,
        0.03 * logistic(gov) + 0.02 * aggregate(A::Transparency) * (1.0 - var(gov))
            - 0.10 * ego()
            - 0.05 * empire()
            - 0.02 * var(cascade)
            - 0.02 * var(pc),
    );
    m.rate(
        align,
        0.04 * logistic(align) - 0.05 * (1.0 - e()) * (1.0 - var(align)) - 0.06 * ego()
            + 0.02 * kin(),
    );
    m.rate(
        ai,
        0.03 * (1.0 - var(ai))
            - 0.04 * (1.0 - aggregate(A::Transparency))
            - 0.04 * aggregate(A::CaptureRisk)
            - 0.10 * aic(),
    );
    m.rate(
        food,
        0.04 * e() * (1.0 - var(food)) - 0.01 * var(food) - 0.04 * p() - 0.05 * drought()
            - 0.01 * mig_in()
            + inflow(F::Resources)
            - outflow(F::Resources)
            - 0.5 * ein(),
    );
    m.rate(
        energy,
        0.03 * e() * (1.0 - var(energy)) - 0.02 * var(energy) - 0.05 * p() - 0.06 * drought(),
    );
    m.rate(pop, 0.1 * (mig_in() - outflow(F::Migration)));
    m.rate(kk, 0.02 * logistic(kk) + 0.3 * kin() - 0.06 * p());
    m.rate(
        kt,
        0.015 * logistic(kt) + 0.02 * mig_in() * (2.0 * var(assim) - 1.0) - 0.05 * p(),
    );
    m.rate(
        kr,
        0.025 * ed() * (1.0 - var(kr)) - 0.03 * (1.0 - ed()) * var(kr) - 0.05 * p(),
    );
    m.rate(
        kw,
        0.01 * (composite(capability) - var(kw)) + 0.02 * var(align) * (1.0 - var(kw))
            - 0.03 * p(),
    );
    m.rate(
        kd,
        0.04 * (1.0 - var(kd)) - 0.05 * (1.0 - var(ai)) - 0.15 * aic(),
    );
    m.rate(
        sov,
        0.02 * (1.0 - var(sov)) + 0.02 * var(gov) - 0.08 * empire() - 0.04 * ego(),
    );
    m.rate(
        pc,
        0.004 + 0.05 * ego() * (1.0 - var(pc)) + 0.03 * empire() * (1.0 - var(pc))
            - 0.06 * var(gov) * var(pc),
    );

    m.derive(assim, min_of(vec![Expr::Const(1.0), var(kt) * var(gov)]));
    m.derive(cascade, pos(0.5 - health()));

    m.critical(Critical::normal(soil, 0.30));
    m.critical(Critical::normal(bio, 0.25));
    m.critical(Critical::normal(water, 0.30));
    m.critical(Critical::normal(know, 0.25));
    m.critical(Critical::normal(gov, 0.35));
    m.critical(Critical::normal(align, 0.25));
    m.critical(Critical::normal(ai, 0.30));
    m.critical(Critical::normal(food, 0.45));
    m.critical(Critical::normal(sov, 0.50));
    m.critical(Critical::normal(kt, 0.20));
    m.critical(Critical::normal(kr, 0.25));
    m.critical(Critical::inverted(pc, 0.65));

    m.flows(FlowBindings {
        capabilities: vec![kk, kt, kr, kw, kd],
        surplus_weights: vec![],
        synergy: vec![
            SynergyPair { name: "craft_coordination".into(), a: kk, b: kr },
            SynergyPair { name: "ecological_knowledge".into(), a: kt, b: kw },
        ],
        reserve: food,
        assimilation: var(assim),
        governance: var(gov),
        ecology: geo(vec![var(soil), var(bio), var(water)]),
    });

    m.profile(
        Profile::Craft,
        vec![(kk, 0.85), (kt, 0.60), (kr, 0.65), (kw, 0.55), (gov, 0.60)],
    );
    m.profile(
        Profile::Coordination,
        vec![(kk, 0.55), (kt, 0.65), (kr, 0.88), (kw, 0.70), (gov, 0.82)],
    );
    m.profile(
        Profile::Ecological,
        vec![(kk, 0.70), (kt, 0.82), (kr, 0.75), (kw, 0.72), (gov, 0.65)],
    );
    m.profile(
        Profile::Knowledge,
        vec![(kk, 0.60), (kt, 0.75), (kr, 0.70), (kw, 0.80), (gov, 0.70)],
    );
    m.profile(
        Profile::Generalist,
        vec![(kk, 0.68), (kt, 0.67), (kr, 0.68), (kw, 0.67), (gov, 0.67)],
    );

    m.build()
}

// ─── Integrated ──────────────────────────────────────────────────────────────

/// Starting values for a node with strong institutions and living practice.
pub const RESILIENT_OVERRIDES: [(&str, f64); 8] = [
    ("knowledge_distribution", 0.88),
    ("succession_depth", 0.85),
    ("adaptive_practice", 0.82),
    ("reality_feedback", 0.80),
    ("practice_attachment", 0.12),
    ("ceremony_vitality", 0.85),
    ("dissent_channel", 0.85),
    ("ai_oversight", 0.88),
];

pub fn integrated() -> Result<Model> {
    let mut m = ModelBuilder::new(INTEGRATED);
    let f = InitSpec::fixed;

    // ecology
    let soil = m.unit("soil_carbon", f(0.85));
    let bio = m.unit("biodiversity", f(0.80));
    let water = m.unit("water_retention", f(0.75));
    // knowledge modes
    let kk = m.unit("k_kinesthetic", f(0.70));
    let kt = m.unit("k_temporal", f(0.65));
    let kr = m.unit("k_relational", f(0.70));
    let ks = m.unit("k_skill", f(0.75));
    let ki = m.unit("k_intuitive", f(0.60));
    let kinst = m.unit("k_institutional", f(0.85));
    let kdig = m.unit("k_digital", f(0.70));
    let kw = m.unit("k_wisdom", f(0.55));
    // intergenerational participation
    let ipi = m.unit("ipi", f(0.72));
    let age_seg = m.unit("age_segregation", f(0.25));
    let spec = m.unit("specialization", f(0.30));
    let mob = m.unit("mobility_disruption", f(0.20));
    let inst_sub = m.unit("institutional_sub", f(0.35));
    let eip = m.unit("elder_in_production", f(0.75));
    let einc = m.unit("elder_incapacity", f(0.10));
    // AI oversight
    let ov = m.unit("ai_oversight", f(0.78));
    let tbw = m.unit("ai_translation_bw", f(0.75));
    let tr = m.unit("ai_transparency", f(0.78));
    let db = m.unit("ai_decision_boundary", f(0.90));
    let cap = m.unit("ai_capture_risk", f(0.15));
    // governance
    let rot = m.unit("role_rotation", f(0.80));
    let dis = m.unit("dissent_channel", f(0.72));
    let pc = m.unit("power_concentration", f(0.22));
    let kdist = m.unit("knowledge_distribution", f(0.68));
    let succ = m.unit("succession_depth", f(0.65));
    let gaming = m.unit("rotation_gaming", f(0.18));
    let council = m.unit("elder_council", f(0.60));
    let voice = m.unit("apprentice_voice", f(0.55));
    // practice alignment
    let ap = m.unit("adaptive_practice", f(0.60));
    let rf = m.unit("reality_feedback", f(0.65));
    let pa = m.unit("practice_attachment", f(0.30));
    let ff = m.unit("form_function", f(0.68));
    let er = m.unit("empty_ritual", f(0.20));
    let fb = m.unit("feedback_blindness", f(0.25));
    let cv = m.unit("ceremony_vitality", f(0.70));
    // provisioning
    let food = m.unit("food_resilience", f(0.70));
    let energy = m.unit("energy_surplus", f(0.65));
    let trade = m.unit("trade_dependency", f(0.35));

    let ecology_expr = || geo(vec![var(soil), var(bio), var(water)]);
    let governance_expr = || geo(vec![var(rot), var(dis), 1.0 - var(pc), var(succ)]);

    let eco = m.composite("ecology", ecology_expr());
    let gv = m.composite("governance", governance_expr());
    let wisdom = m.composite("wisdom_base", geo(vec![var(kk), var(kt), var(kr), var(ki)]));
    let ai_safety = m.composite(
        "ai_safety",
        var(ov) * var(tr) * var(db) * (1.0 - var(cap)),
    );
    let rot_eff = m.composite(
        "rotation_efficacy",
        var(rot) * (1.0 - var(gaming)) * var(succ),
    );
    let k_prot = m.composite(
        "knowledge_protection",
        var(kdist) * (1.0 - var(gaming)) * var(kdig),
    );
    let align_eff = m.composite(
        "alignment_efficacy",
        var(ap) * var(rf) * (1.0 - var(pa)),
    );
    let core = m.composite("core_knowledge", geo(vec![var(kk), var(kt), var(kr)]));
    let drag = m.composite("institutional_drag", 0.5 * pos(var(kinst) - 0.6));

    let eco_lag = m.lag("ecology_delayed", eco, ECOLOGY_LAG, LagSeed::Initial);
    let core_lag = m.lag(
        "core_knowledge_delayed",
        core,
        KNOWLEDGE_LAG,
        LagSeed::Value(KNOWLEDGE_LAG_SEED),
    );

    let e = || composite(eco);
    let g = || composite(gv);
    let kp = || composite(drag);
    let ae = || composite(align_eff);
    let ed = || delayed(eco_lag);
    let b = || stress(S::Pressure);
    let drg = || stress(S::Drought);
    let ego = || stress(S::EgoCapture);
    let aic = || stress(S::AiCorruption);
    let seg = || stress(S::AgeSegregation);
    let mobs = || stress(S::Mobility);
    let spc = || stress(S::Specialization);
    let cult = || stress(S::CulturalRigidity);
    let inst = || stress(S::InstitutionalReplacement);
    let crisis = || stress(S::ExternalCrisis);

    // practice alignment
    m.rate(
        rf,
        0.03 * (1.0 - var(rf)) + 0.04 * e() - 0.10 * cult() - 0.08 * inst() - 0.05 * var(fb),
    );
    m.rate(
        ap,
        0.03 * (1.0 - var(ap)) + 0.04 * var(rf) - 0.10 * cult() - 0.04 * var(pa)
            - 0.06 * inst(),
    );
    m.rate(
        pa,
        0.008 + 0.04 * cult() * (1.0 - var(pa)) + 0.02 * (1.0 - var(ff)) * (1.0 - var(pa))
            - 0.06 * var(rf) * var(pa)
            - 0.04 * var(ap) * var(pa),
    );
    m.rate(
        ff,
        0.02 * (1.0 - var(ff)) * var(ap) - 0.04 * (1.0 - var(ap))
            - 0.06 * crisis() * (1.0 - var(ap))
            + 0.03 * var(rf)
            - 0.03 * var(er),
    );
    m.rate(
        er,
        0.03 * var(pa) * (1.0 - var(er)) + 0.02 * (1.0 - var(ff)) - 0.06 * var(ap) * var(er)
            - 0.04 * var(rf) * var(er),
    );
    m.rate(
        fb,
        0.006 + 0.05 * inst() * (1.0 - var(fb)) + 0.03 * cult() * (1.0 - var(fb))
            - 0.06 * var(rf) * var(fb)
            - 0.04 * var(ap) * var(fb),
    );
    m.rate(
        cv,
        0.03 * (1.0 - var(cv)) * var(ap) + 0.02 * var(ff) * (1.0 - var(cv)) - 0.10 * inst()
            - 0.06 * var(er)
            - 0.05 * b()
            - 0.04 * var(pa),
    );

    // intergenerational participation
    m.rate(
        age_seg,
        0.03 * b() * (1.0 - var(age_seg)) + 0.04 * seg() * (1.0 - var(age_seg))
            - 0.04 * var(ipi) * var(age_seg),
    );
    m.rate(
        spec,
        0.04 * b() * (1.0 - var(spec)) + 0.03 * spc() * (1.0 - var(spec))
            - 0.03 * (1.0 - var(age_seg)) * var(spec),
    );
    m.rate(mob, 0.02 * b() + 0.05 * mobs() - 0.03 * g() * var(mob));
    m.rate(
        inst_sub,
        0.05 * (b() + inst()) * (1.0 - var(inst_sub)) - 0.04 * var(ipi) * var(inst_sub),
    );
    m.rate(einc, 0.005 - 0.01 * e());
    m.rate(
        eip,
        0.04 * (1.0 - var(eip)) - 0.08 * seg() - 0.03 * var(inst_sub) - 0.02 * var(age_seg),
    );

    // ecology
    m.rate(soil, 0.03 * e() * (1.0 - var(soil)) - 0.05 * b() - 0.08 * drg());
    m.rate(bio, 0.04 * e() * (1.0 - var(bio)) - 0.06 * b() - 0.03 * kp());
    m.rate(water, 0.03 * (1.0 - var(water)) - 0.10 * drg() - 0.04 * b());

    // knowledge modes
    m.rate(
        kk,
        0.04 * var(ipi) * (1.0 - var(kk)) + 0.02 * logistic(kk) - 0.12 * b() - 0.05 * kp()
            - 0.06 * var(age_seg),
    );
    m.rate(
        kt,
        0.03 * var(ipi) * (1.0 - var(kt)) + 0.04 * var(cv) * (1.0 - var(kt))
            + 0.01 * logistic(kt)
            - 0.06 * b()
            - 0.08 * var(mob)
            - 0.06 * var(er),
    );
    m.rate(
        kr,
        0.025 * ed() * (1.0 - var(kr)) + 0.02 * var(ipi) * ed() - 0.08 * b()
            - 0.05 * (1.0 - ed()),
    );
    m.rate(
        ks,
        0.05 * var(ipi) * (1.0 - var(ks)) + 0.03 * g() * (1.0 - var(ks)) - 0.07 * b()
            - 0.05 * var(spec),
    );
    m.rate(
        ki,
        0.015 * var(kk) * var(kt) * (1.0 - var(ki)) - 0.10 * b() - 0.06 * kp(),
    );
    m.rate(
        kinst,
        0.05 * b() * (1.0 - var(kinst)) + 0.02 * (0.7 * g() - var(kinst)),
    );
    m.rate(kdig, 0.04 * (1.0 - var(kdig)) - 0.15 * aic());
    m.rate(
        kw,
        0.008 * (composite(wisdom) - var(kw)) + 0.03 * var(cv) * (1.0 - var(kw)) - 0.03 * b()
            - 0.04 * var(er),
    );

    // AI oversight
    m.rate(ov, 0.02 * (1.0 - var(ov)) - 0.20 * aic() - 0.05 * var(pc));
    m.rate(
        tbw,
        0.03 * (1.0 - var(tbw)) - 0.10 * aic() - 0.03 * (1.0 - var(kk)),
    );
    m.rate(
        tr,
        0.02 * (1.0 - var(tr)) - 0.12 * aic() - 0.06 * ego() + 0.03 * var(dis),
    );
    m.rate(
        db,
        0.01 * (1.0 - var(db)) - 0.08 * aic() - 0.04 * ego() - 0.03 * crisis(),
    );
    m.rate(
        cap,
        0.02 * aic() * (1.0 - var(cap)) + 0.01 * var(pc) * (1.0 - var(cap))
            - 0.06 * var(ov) * var(cap)
            - 0.04 * var(tr) * var(cap),
    );

    // governance
    m.rate(
        pc,
        0.004 + 0.05 * ego() * (1.0 - var(pc)) + 0.03 * crisis() * (1.0 - var(pc))
            - 0.06 * composite(rot_eff) * var(pc)
            - 0.05 * var(dis) * var(pc)
            - 0.04 * composite(k_prot) * var(pc)
            - 0.03 * composite(ai_safety) * var(pc),
    );
    m.rate(
        rot,
        0.03 * (1.0 - var(rot)) * var(succ) - 0.08 * ego() - 0.04 * crisis() + 0.02 * ae(),
    );
    m.rate(
        gaming,
        0.02 * ego() * (1.0 - var(gaming)) + 0.01 - 0.05 * var(dis) * var(gaming)
            - 0.04 * composite(k_prot) * var(gaming),
    );
    m.rate(
        dis,
        0.03 * (1.0 - var(dis)) - 0.12 * ego() - 0.08 * var(pc) + 0.04 * var(voice)
            + 0.02 * composite(ai_safety)
            + 0.03 * ae()
            + 0.02 * (delayed(core_lag) - 0.5),
    );
    m.rate(
        kdist,
        0.03 * var(rot) * (1.0 - var(kdist)) + 0.04 * var(voice) * (1.0 - var(kdist))
            - 0.06 * var(gaming)
            - 0.04 * inst()
            + 0.02 * var(cv),
    );
    m.rate(
        succ,
        0.04 * var(kdist) * (1.0 - var(succ)) - 0.06 * kp() - 0.03 * var(gaming)
            + 0.02 * var(voice),
    );
    m.rate(
        council,
        0.02 * (1.0 - var(council)) - 0.04 * ego() - 0.03 * inst() + 0.02 * var(cv),
    );
    m.rate(
        voice,
        0.03 * (1.0 - var(voice)) * var(succ) - 0.06 * ego() - 0.04 * var(pc)
            + 0.02 * var(dis),
    );

    // provisioning
    m.rate(
        energy,
        0.04 * e() * (1.0 - var(energy)) - 0.08 * b() - 0.12 * drg(),
    );
    m.rate(
        food,
        0.03 * var(kr) * e() * (1.0 - var(food)) - 0.06 * b() - 0.04 * drg(),
    );
    m.rate(
        trade,
        0.04 * b() * (1.0 - var(trade)) - 0.03 * var(food),
    );

    m.derive(
        ipi,
        min_of(vec![
            Expr::Const(1.0),
            geo(vec![
                1.0 - var(age_seg),
                1.0 - var(spec),
                1.0 - var(mob),
                1.0 - var(inst_sub),
            ]) * (var(eip) + 0.8 * var(einc)),
        ]),
    );

    m.critical(Critical::normal(soil, 0.30));
    m.critical(Critical::normal(bio, 0.25));
    m.critical(Critical::normal(water, 0.30));
    m.critical(Critical::normal(kk, 0.25));
    m.critical(Critical::normal(kt, 0.20));
    m.critical(Critical::normal(kr, 0.25));
    m.critical(Critical::normal(kw, 0.15));
    m.critical(Critical::normal(ipi, 0.25));
    m.critical(Critical::normal(ov, 0.35));
    m.critical(Critical::normal(tbw, 0.30));
    m.critical(Critical::normal(db, 0.55));
    m.critical(Critical::normal(dis, 0.35));
    m.critical(Critical::inverted(pc, 0.65));
    m.critical(Critical::normal(kdist, 0.40));
    m.critical(Critical::normal(succ, 0.30));
    m.critical(Critical::normal(ap, 0.25));
    m.critical(Critical::normal(rf, 0.30));
    m.critical(Critical::inverted(pa, 0.70));
    m.critical(Critical::inverted(er, 0.65));
    m.critical(Critical::normal(food, 0.40));

    m.flows(FlowBindings {
        capabilities: vec![kk, kt, kr, kw, kdig],
        surplus_weights: vec![],
        synergy: vec![
            SynergyPair { name: "craft_coordination".into(), a: kk, b: kr },
            SynergyPair { name: "ecological_knowledge".into(), a: kt, b: kw },
        ],
        reserve: food,
        assimilation: var(ipi),
        governance: governance_expr(),
        ecology: ecology_expr(),
    });

    m.profile(Profile::Craft, vec![(kk, 0.85), (kt, 0.60), (kr, 0.65), (kw, 0.55)]);
    m.profile(Profile::Coordination, vec![(kk, 0.55), (kt, 0.65), (kr, 0.88), (kw, 0.70)]);
    m.profile(Profile::Ecological, vec![(kk, 0.70), (kt, 0.82), (kr, 0.75), (kw, 0.72)]);
    m.profile(Profile::Knowledge, vec![(kk, 0.60), (kt, 0.75), (kr, 0.70), (kw, 0.80)]);
    m.profile(Profile::Generalist, vec![(kk, 0.68), (kt, 0.67), (kr, 0.68), (kw, 0.67)]);

    m.build()
}

// ─── Seeded ──────────────────────────────────────────────────────────────────

/// Isolation length after which an unpractised seed starts to decay.
const BUNKER_AFTER: f64 = 30.0;
/// Fidelity lost per unit time at exactly `BUNKER_AFTER` steps cut off.
const BUNKER_DECAY: f64 = 0.02;
/// How fast a backlog of suggestions can clear when absorption allows it.
const SUGGESTION_CLEARANCE: f64 = 10.0;

pub fn seeded() -> Result<Model> {
    let mut m = ModelBuilder::new(SEEDED);
    let eco = m.unit("ecology", InitSpec::varied(0.78, 0.5));
    let kk = m.unit("k_kinesthetic", InitSpec::varied(0.68, 1.0));
    let kt = m.unit("k_temporal", InitSpec::varied(0.65, 1.0));
    let kr = m.unit("k_relational", InitSpec::varied(0.68, 1.0));
    let kw = m.unit("k_wisdom", InitSpec::varied(0.65, 1.0));
    let gov = m.unit("governance", InitSpec::varied(0.67, 1.0));
    let depth = m.unit("practice_depth", InitSpec::fixed(0.65));
    let breadth = m.unit("practice_breadth", InitSpec::fixed(0.60));
    let assim = m.unit("assimilation_rate", InitSpec::fixed(0.55));
    let pop = m.var("population", Bounds::new(0.3, 2.0), InitSpec::fixed(1.0));
    // seed AI
    let fidelity = m.unit("seed_fidelity", InitSpec::fixed(0.80));
    let adapt = m.unit("seed_local_adapt", InitSpec::fixed(0.10));
    let learning = m.unit("ai_learning_rate", InitSpec::fixed(0.40));
    let pending = m.unit("ai_suggestions_pending", InitSpec::fixed(0.0));
    let over = m.unit("seed_overconfidence", InitSpec::fixed(0.05));
    let cascade = m.unit("cascade_risk", InitSpec::fixed(0.10));

    let p = || stress(S::Pressure);
    let ego = || stress(S::EgoCapture);
    let kin = || inflow(F::Knowledge);
    let mig_in = || inflow(F::Migration);
    // pressure erodes intergenerational transfer before it erodes practice
    let ipi = || var(depth) * (1.0 - 0.3 * p());
    let implemented = || {
        min_of(vec![
            SUGGESTION_CLEARANCE * var(pending),
            0.3 * var(assim),
        ])
    };

    m.rate(
        eco,
        0.04 * logistic(eco) - 0.07 * p() - 0.12 * stress(S::Drought)
            - 0.15 * inflow(F::Ecological)
            + 0.01 * inflow(F::Resources),
    );
    m.rate(kk, 0.03 * ipi() * (1.0 - var(kk)) - 0.10 * p() + 0.3 * kin());
    m.rate(
        kt,
        0.02 * ipi() * (1.0 - var(kt)) - 0.05 * p() + 0.02 * mig_in() * (var(kr) - 0.5),
    );
    m.rate(kr, 0.025 * var(eco) * (1.0 - var(kr)) + 0.4 * kin() - 0.06 * p());
    m.rate(
        kw,
        0.008 * (var(kk) * var(kt) * var(kr) - var(kw)) - 0.03 * p(),
    );
    m.rate(
        gov,
        0.02 * logistic(gov) - 0.10 * ego() - 0.04 * var(over) + 0.02 * kin(),
    );
    m.rate(
        depth,
        0.03 * ipi() * (1.0 - var(depth)) - 0.08 * p() - 0.04 * ego()
            + 0.02 * kin()
            + 0.05 * implemented(),
    );
    m.rate(
        breadth,
        0.02 * kin() * (1.0 - var(breadth)) + 0.01 * mig_in() * (1.0 - var(breadth))
            - 0.05 * p(),
    );
    m.rate(pop, 0.05 * (mig_in() - outflow(F::Migration)));

    m.rate(
        adapt,
        0.02 * var(depth) * var(kk) * (1.0 - var(adapt)) - 0.005,
    );
    m.rate(
        learning,
        0.01 * var(adapt) * (1.0 - var(learning)) - 0.005 * (1.0 - var(depth)),
    );
    m.rate(pending, 0.1 * var(learning) * var(fidelity) - implemented());
    m.rate(
        over,
        0.05 * pos(var(pending) - var(assim)) - 0.03 * var(assim) * var(over),
    );
    m.rate(
        fidelity,
        0.01 * var(depth) * (1.0 - var(fidelity))
            - 0.005 * (1.0 - var(depth))
            - 0.01 * var(over)
            - BUNKER_DECAY / BUNKER_AFTER * isolated_for() * above(isolated_for(), BUNKER_AFTER),
    );

    m.derive(
        assim,
        min_of(vec![Expr::Const(0.95), 0.1 + pos(var(kt) * var(gov) - 0.1)]),
    );
    m.derive(cascade, pos(0.5 - health()));

    m.critical(Critical::normal(eco, 0.30));
    m.critical(Critical::normal(kk, 0.25));
    m.critical(Critical::normal(kt, 0.20));
    m.critical(Critical::normal(kr, 0.25));
    m.critical(Critical::normal(gov, 0.35));
    m.critical(Critical::normal(depth, 0.25));
    m.critical(Critical::normal(fidelity, 0.30));
    m.critical(Critical::inverted(over, 0.60));

    m.flows(FlowBindings {
        capabilities: vec![kk, kr, kt, kw],
        surplus_weights: vec![var(depth), var(gov), var(eco), var(fidelity)],
        synergy: vec![
            SynergyPair { name: "craft_coordination".into(), a: kk, b: kr },
            SynergyPair { name: "ecological_knowledge".into(), a: kt, b: kw },
        ],
        reserve: eco,
        assimilation: var(assim) * var(kt),
        governance: var(gov),
        ecology: var(eco),
    });

    m.profile(
        Profile::Craft,
        vec![(kk, 0.85), (kt, 0.60), (kr, 0.65), (kw, 0.55), (gov, 0.60)],
    );
    m.profile(
        Profile::Coordination,
        vec![(kk, 0.55), (kt, 0.65), (kr, 0.88), (kw, 0.70), (gov, 0.82)],
    );
    m.profile(
        Profile::Ecological,
        vec![(kk, 0.70), (kt, 0.82), (kr, 0.75), (kw, 0.72), (gov, 0.65)],
    );
    m.profile(
        Profile::Knowledge,
        vec![(kk, 0.60), (kt, 0.75), (kr, 0.70), (kw, 0.80), (gov, 0.70)],
    );
    m.profile(
        Profile::Generalist,
        vec![(kk, 0.68), (kt, 0.67), (kr, 0.68), (kw, 0.67), (gov, 0.67)],
    );

    m.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_build() {
        let fed = federation().unwrap();
        assert_eq!(fed.schema.len(), 19);
        assert_eq!(fed.criticals.len(), 12);
        assert_eq!(fed.lags.len(), 1);
        assert_eq!(fed.derived.len(), 2);

        let full = integrated().unwrap();
        assert_eq!(full.schema.len(), 41);
        assert_eq!(full.criticals.len(), 20);
        assert_eq!(full.rates.len(), 40);
        assert_eq!(full.lags.len(), 2);

        let seed = seeded().unwrap();
        assert_eq!(seed.schema.len(), 16);
        assert_eq!(seed.criticals.len(), 8);
        assert_eq!(seed.rates.len(), 14);
        assert_eq!(seed.derived.len(), 2);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(by_name("Federation").unwrap().name, FEDERATION);
        assert_eq!(by_name("coupled").unwrap().name, INTEGRATED);
        assert_eq!(by_name("seeded").unwrap().name, SEEDED);
        assert!(matches!(by_name("village"), Err(ConfigError::UnknownModel(_))));
    }

    #[test]
    fn test_population_has_wide_range() {
        let fed = federation().unwrap();
        let pop = fed.var("population").unwrap();
        assert_eq!(fed.schema.spec(pop).bounds, Bounds::new(0.0, 2.0));
    }

    #[test]
    fn test_resilient_overrides_name_real_variables() {
        let full = integrated().unwrap();
        for (name, value) in RESILIENT_OVERRIDES {
            assert!(full.var(name).is_some(), "{name}");
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_power_concentration_is_inverted_everywhere() {
        for model in [federation().unwrap(), integrated().unwrap()] {
            let pc = model.var("power_concentration").unwrap();
            let c = model.criticals.iter().find(|c| c.var == pc).unwrap();
            assert_eq!(c.direction, crate::health::Direction::Inverted);
        }
    }

    #[test]
    fn test_seeded_node_holds_steady_unstressed() {
        use crate::federation::FederationAggregate;
        use crate::kernel::{advance, Node, StepInputs};
        use crate::types::{FlowTotals, StressVector};

        let model = seeded().unwrap();
        let aggregate = FederationAggregate::default();
        let (mut node, _) = Node::spawn(&model, 0, model.schema.base_state(), &aggregate);
        let inputs = StepInputs {
            stress: &StressVector::zero(),
            flows: &FlowTotals::default(),
            aggregate: &aggregate,
            isolated_for: 0,
        };
        for _ in 0..350 {
            node = advance(&model, &node, &inputs, 0.1).node;
            assert!(model.health(&node.state).health > 0.4);
        }
        let over = model.var("seed_overconfidence").unwrap();
        assert!(node.state[over] < 0.05);
    }
}
