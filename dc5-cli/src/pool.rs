use std::collections::BTreeSet;

use clap::ValueEnum;
use dc5_core::models::{Combo, Draw, DrawError, DRAW_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Method {
    /// Au moins un chiffre du tirage de référence
    #[default]
    OneDigit,
    /// Au moins une paire de chiffres du tirage de référence
    Pair,
}

/// Tous les n-uplets de chiffres 0-9 de longueur `len`.
fn tails(len: usize) -> impl Iterator<Item = Vec<u8>> {
    let total = 10usize.pow(len as u32);
    (0..total).map(move |mut n| {
        let mut digits = vec![0u8; len];
        for slot in digits.iter_mut().rev() {
            *slot = (n % 10) as u8;
            n /= 10;
        }
        digits
    })
}

fn complete(head: &[u8], pool: &mut BTreeSet<Combo>) -> Result<(), DrawError> {
    for tail in tails(DRAW_LEN - head.len()) {
        let mut digits = [0u8; DRAW_LEN];
        digits[..head.len()].copy_from_slice(head);
        digits[head.len()..].copy_from_slice(&tail);
        pool.insert(Combo::new(digits)?);
    }
    Ok(())
}

/// Pool de candidats canoniques, trié et sans doublon.
pub fn generate_pool(seed: &Draw, method: Method) -> Result<Vec<Combo>, DrawError> {
    let digits = seed.digits();
    let mut pool = BTreeSet::new();

    match method {
        Method::OneDigit => {
            let distinct: BTreeSet<u8> = digits.iter().copied().collect();
            for d in distinct {
                complete(&[d], &mut pool)?;
            }
        }
        Method::Pair => {
            let mut pairs = BTreeSet::new();
            for i in 0..DRAW_LEN {
                for j in i + 1..DRAW_LEN {
                    pairs.insert((digits[i].min(digits[j]), digits[i].max(digits[j])));
                }
            }
            for (a, b) in pairs {
                complete(&[a, b], &mut pool)?;
            }
        }
    }

    log::debug!("Pool {:?} : {} candidats", method, pool.len());
    Ok(pool.into_iter().collect())
}
