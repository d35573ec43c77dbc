use crate::model::{Term, Triple};
use sha2::{Digest, Sha256};

pub trait ContentHash {
    fn content_hash(&self) -> String;
}

fn update_term(hasher: &mut Sha256, term: &Term) {
    match term {
        Term::Id(id) => {
            hasher.update(b"i");
            hasher.update(id.to_le_bytes());
        }
        Term::Label(label) => {
            hasher.update(b"s");
            hasher.update((label.len() as u64).to_le_bytes());
            hasher.update(label.as_bytes());
        }
    }
}

impl ContentHash for [Triple] {
    fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.len() as u64).to_le_bytes());
        for triple in self {
            update_term(&mut hasher, &triple.head);
            update_term(&mut hasher, &triple.relation);
            update_term(&mut hasher, &triple.tail);
        }
        format!("{:x}", hasher.finalize())
    }
}
