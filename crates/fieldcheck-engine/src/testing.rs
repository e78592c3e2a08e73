//! Catalog fixtures for unit tests

use fieldcheck_model::{Catalog, ChecklistDefinition, Draft, Item, ItemKind, Role, Section};

fn info_basica() -> Section {
    Section::new(
        "info_basica",
        vec![
            Item::new("filial", ItemKind::Text).required(),
            Item::new("gestor", ItemKind::Text).required(),
        ],
    )
}

fn pass_fail_section(id: &str, items: &[&str]) -> Section {
    Section::new(
        id,
        items
            .iter()
            .map(|item| {
                Item::new(*item, ItemKind::BooleanPassFail).with_text(format!("question {item}"))
            })
            .collect(),
    )
}

/// gerencial (2 required + 4 scored), limpeza (1 required + 4 scored), notas (no scored items)
pub(crate) fn sample_catalog() -> Catalog {
    let gerencial = ChecklistDefinition::new(
        "gerencial",
        vec![
            Section::new("intro", vec![Item::new("intro_header", ItemKind::Header)]),
            info_basica(),
            pass_fail_section("pop", &["pop_1", "pop_2", "pop_3", "pop_4"]),
        ],
    );

    let limpeza = ChecklistDefinition::new(
        "limpeza",
        vec![
            Section::new("info_basica", vec![Item::new("filial", ItemKind::Text).required()]),
            pass_fail_section(
                "banheiro",
                &["limp_banheiro", "limp_cozinha", "limp_deposito", "limp_pallets"],
            ),
        ],
    );

    let notas = ChecklistDefinition::new(
        "notas",
        vec![Section::new(
            "obs",
            vec![
                Item::new("observacoes", ItemKind::Textarea),
                Item::new("nota", ItemKind::Rating),
            ],
        )],
    );

    Catalog::new(vec![gerencial, limpeza, notas]).expect("fixture catalog is valid")
}

pub(crate) fn sign_all(draft: &mut Draft) {
    draft.set_signature(Role::manager(), "data:manager".into());
    draft.set_signature(Role::coordinator(), "data:coordinator".into());
}

/// Fill every required item of a checklist
pub(crate) fn fill_required(catalog: &Catalog, checklist: &str, draft: &mut Draft) {
    let definition = catalog.get(checklist).expect("fixture checklist exists");
    for item in definition.items().filter(|i| i.required) {
        draft.set_answer(definition.id.clone(), item.id.clone(), "ok".into());
    }
}
