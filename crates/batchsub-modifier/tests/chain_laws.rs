use batchsub_modifier::{
    DropPathsOnData, IsMcModifier, JobTemplate, Marker, MaxOutputModifier, Modifier,
    ModifierChain, ModifierError, Replacement, SpecialPeriodModifier, TemplateEdits,
};
use batchsub_sample::Sample;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const TEMPLATE: &str = "import cms\nis_mc = True\nH = False\nprocess = cms.Process()\n";

fn sample_strategy() -> impl Strategy<Value = Sample> {
    (
        prop_oneof![
            Just("JetHT2016H2".to_string()),
            Just("JetHT2016C".to_string()),
            "[a-z]{1,10}",
        ],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(name, is_mc, condor)| {
            let s = if is_mc {
                Sample::simulation(name, 1000)
            } else {
                Sample::recorded(name)
            };
            s.with_condor(condor)
        })
}

#[test]
fn test_reference_chain_renders_data_job() {
    let template = JobTemplate::compile(TEMPLATE);
    let chain = ModifierChain::new()
        .with(IsMcModifier)
        .with(SpecialPeriodModifier::default())
        .with(DropPathsOnData::new(["pFullSel"]))
        .with(MaxOutputModifier::new(500));

    let sample = Sample::recorded("JetHT2016H3");
    let edits = chain.validated_edits(&template, &sample).unwrap();
    let job = template.render(sample.name(), &edits).unwrap();

    assert_eq!(
        job,
        "import cms\nis_mc = False\nH = True\nprocess = cms.Process()\n\
         if hasattr(process, 'pFullSel'):\n    del process.pFullSel\n\
         process.maxEvents.output = cms.untracked.int32(500)"
    );
}

#[test]
fn test_simulation_job_left_as_simulation() {
    let template = JobTemplate::compile(TEMPLATE);
    let chain = ModifierChain::new()
        .with(IsMcModifier)
        .with(SpecialPeriodModifier::default());

    let sample = Sample::simulation("ttbar", 1000);
    let edits = chain.validated_edits(&template, &sample).unwrap();
    assert_eq!(template.render(sample.name(), &edits).unwrap(), TEMPLATE);
}

#[test]
fn test_drifted_marker_aborts() {
    // template edited so the simulation flag no longer matches
    let template = JobTemplate::compile("is_mc  = True\nH = False\n");
    let chain = ModifierChain::new().with(IsMcModifier);

    let err = chain
        .validated_edits(&template, &Sample::recorded("JetHT2016G"))
        .unwrap_err();
    match err {
        ModifierError::TemplateDrift {
            sample, message, ..
        } => {
            assert_eq!(sample, "JetHT2016G");
            assert!(message.starts_with("trying to submit on data"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // simulation asks for no replacement, so nothing can drift
    assert!(chain
        .validated_edits(&template, &Sample::simulation("ttbar", 1))
        .is_ok());
}

#[test]
fn test_second_edit_of_same_marker_aborts() {
    let template = JobTemplate::compile(TEMPLATE);
    let chain = ModifierChain::new().with(IsMcModifier).with(IsMcModifier);
    let sample = Sample::recorded("JetHT2016G");

    let err = chain.validated_edits(&template, &sample).unwrap_err();
    assert!(matches!(err, ModifierError::TemplateDrift { .. }));

    // the first edit alone still applies
    let edits = ModifierChain::new()
        .with(IsMcModifier)
        .validated_edits(&template, &sample)
        .unwrap();
    assert!(template
        .render(sample.name(), &edits)
        .unwrap()
        .contains("is_mc = False\n"));
}

proptest! {
    #[test]
    fn prop_chain_is_concatenation(sample in sample_strategy(), n in 1u64..10_000) {
        let a = ModifierChain::new()
            .with(IsMcModifier)
            .with(DropPathsOnData::new(["pFullSel", "pOther"]));
        let b = ModifierChain::new()
            .with(SpecialPeriodModifier::default())
            .with(MaxOutputModifier::new(n));

        let ea = a.edits(&sample);
        let eb = b.edits(&sample);
        let combined = ModifierChain::new().with(a).with(b).edits(&sample);

        let mut additions = ea.additions.clone();
        additions.extend(eb.additions.clone());
        let mut replacements = ea.replacements.clone();
        replacements.extend(eb.replacements.clone());

        prop_assert_eq!(combined.additions, additions);
        prop_assert_eq!(combined.replacements, replacements);
    }

    #[test]
    fn prop_missing_marker_never_renders(
        sample in sample_strategy(),
        marker in prop_oneof![Just(Marker::IsMc), Just(Marker::SpecialPeriod)],
    ) {
        let template = JobTemplate::compile("process = cms.Process()\n");
        let modifier = move |_: &Sample| {
            TemplateEdits::new().with_replacement(Replacement::new(marker, "x", "drift"))
        };
        let chain = ModifierChain::new().with(modifier);

        let is_drift = matches!(
            chain.validated_edits(&template, &sample),
            Err(ModifierError::TemplateDrift { .. })
        );
        prop_assert!(is_drift);
        prop_assert!(template.render(sample.name(), &chain.edits(&sample)).is_err());
    }
}
