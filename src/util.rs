/*
 * Copyright (C) 2020 Oakes, Gregory <gregoryoakes@fastmail.com>
 * Author: Oakes, Gregory <gregory.oakes@fastmail.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use std::iter;

use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub fn random_string(len: usize) -> String {
    let mut rng = thread_rng();
    iter::repeat(())
        .map(|()| rng.sample(Alphanumeric))
        .take(len)
        .collect::<String>()
}

/// Splits a free-text query into the lowercase words the text index matches on.
pub fn search_terms(query: &str) -> Vec<String> {
    let mut terms = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<String>>();
    terms.sort();
    terms.dedup();
    terms
}

/// Usernames end up in redirect targets and URL paths, so they are kept to a
/// conservative alphabet.
pub fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 32
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_strings_are_alphanumeric() {
        let s = random_string(24);
        assert_eq!(s.len(), 24);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(s, random_string(24));
    }

    #[test]
    fn terms_are_lowercased_and_deduplicated() {
        assert_eq!(
            search_terms("Frozen  margarita, MARGARITA!"),
            vec!["frozen".to_string(), "margarita".to_string()]
        );
        assert!(search_terms("").is_empty());
        assert!(search_terms("  ?! ").is_empty());
        assert_eq!(
            search_terms("1.5 oz"),
            vec!["1".to_string(), "5".to_string(), "oz".to_string()]
        );
    }

    #[test]
    fn username_alphabet() {
        assert!(valid_username("bar.tender_01"));
        assert!(!valid_username(""));
        assert!(!valid_username("two words"));
        assert!(!valid_username("slash/name"));
    }
}
