#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sheet_stack::{
    DetailsParams, FormParams, MemoryNavigator, Navigator, RestorePolicy, SheetController,
    SheetMode, SheetSyncConfig, decode_query,
};

#[derive(Debug, Arbitrary)]
enum Op {
    ClientForm { mode: u8, slug: String, id: Option<String>, reset: bool },
    ClientDetails { slug: String, id: String, reset: bool },
    CaseForm { mode: u8, slug: String, id: Option<String>, reset: bool },
    CaseDetails { slug: String, id: String, reset: bool },
    TrialForm { mode: u8, slug: String, id: Option<String>, reset: bool },
    OpponentForm { mode: u8, slug: String, id: Option<String>, reset: bool },
    Close,
    Reset,
    Back,
    Forward,
    Visit(String),
}

fn form(mode: u8, slug: String, id: Option<String>, reset: bool) -> FormParams {
    let mut params = FormParams::create(slug).with_reset(reset);
    params.mode = SheetMode::ALL[usize::from(mode) % SheetMode::ALL.len()];
    params.entity_id = id;
    params
}

fuzz_target!(|input: (bool, Vec<Op>)| {
    let (full_stack, ops) = input;
    if ops.len() > 64 {
        return;
    }
    let restore = if full_stack {
        RestorePolicy::FullStack
    } else {
        RestorePolicy::ActiveOnly
    };
    let config = SheetSyncConfig::default().with_restore(restore);
    let Ok(mut c) = SheetController::with_config(MemoryNavigator::new(), config.clone()) else {
        return;
    };

    for op in ops {
        let mutated = match op {
            Op::ClientForm { mode, slug, id, reset } => {
                c.open_client_form(form(mode, slug, id, reset)).is_ok()
            }
            Op::ClientDetails { slug, id, reset } => c
                .open_client_details(DetailsParams::new(slug, id).with_reset(reset))
                .is_ok(),
            Op::CaseForm { mode, slug, id, reset } => {
                c.open_case_form(form(mode, slug, id, reset)).is_ok()
            }
            Op::CaseDetails { slug, id, reset } => c
                .open_case_details(DetailsParams::new(slug, id).with_reset(reset))
                .is_ok(),
            Op::TrialForm { mode, slug, id, reset } => {
                c.open_trial_form(form(mode, slug, id, reset)).is_ok()
            }
            Op::OpponentForm { mode, slug, id, reset } => {
                c.open_opponent_form(form(mode, slug, id, reset)).is_ok()
            }
            Op::Close => c.close().is_some(),
            Op::Reset => c.reset() > 0,
            Op::Back => {
                c.navigator_mut().back();
                c.on_navigation();
                false
            }
            Op::Forward => {
                c.navigator_mut().forward();
                c.on_navigation();
                false
            }
            Op::Visit(query) => {
                c.navigator_mut().visit(&query);
                c.initialize_from_url();
                false
            }
        };

        // After a successful mutation the URL encodes the active sheet.
        if mutated {
            let decoded = decode_query(&c.navigator().current_query(), &config);
            assert_eq!(decoded.dropped, 0);
            assert_eq!(decoded.descriptors.last(), c.active());
        }
    }
});
