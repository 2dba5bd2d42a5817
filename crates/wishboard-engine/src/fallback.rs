use chrono::Utc;
use rand::Rng;

/// A curated image set plus the prompt keywords that select it.
struct Bucket {
    name: &'static str,
    keywords: &'static [&'static str],
    images: &'static [&'static str],
}

// Tested in order; the first keyword hit wins.
const BUCKETS: &[Bucket] = &[
    Bucket {
        name: "VEHICLES",
        keywords: &[
            "auto", "carro", "coche", "ferrari", "lamborghini", "porsche", "bmw", "mercedes",
            "audi", "moto", "yate", "barco", "jet", "avion", "avión", "tesla", "camioneta",
            "bugatti", "mclaren",
        ],
        images: &[
            "https://images.unsplash.com/photo-1503376763036-066120622c74?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1583847668182-f8759530598b?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1552519507-da3b142c6e3d?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1494976388531-d1058494cdd8?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1563911302283-d2bc129e7c1f?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1559087867-ce4c91325525?q=80&w=1000&auto=format&fit=crop",
        ],
    },
    Bucket {
        name: "TRAVEL",
        keywords: &[
            "viaje", "trip", "paris", "roma", "playa", "montaña", "hotel", "resort",
            "vacaciones", "mundo", "japon", "dubai", "grecia", "italia", "suiza",
        ],
        images: &[
            "https://images.unsplash.com/photo-1519167758481-83f550bb49b3?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1476514525535-07fb3b4ae5f1?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1502602898657-3e91760cbb34?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1520250497591-112f2f40a3f4?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?q=80&w=1000&auto=format&fit=crop",
        ],
    },
    Bucket {
        name: "TECH",
        keywords: &[
            "computadora", "pc", "macbook", "iphone", "celular", "camara", "cámara", "setup",
            "gamer", "reloj", "rolex", "patek",
        ],
        images: &[
            "https://images.unsplash.com/photo-1519389950473-47ba0277781c?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1550745165-9bc0b252726f?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1525547719571-a2d4ac8945e2?q=80&w=1000&auto=format&fit=crop",
        ],
    },
    Bucket {
        name: "HOME",
        keywords: &[
            "casa", "hogar", "mansion", "mansión", "departamento", "apartamento", "muebles",
            "sala", "cocina", "jardin", "piscina", "penthouse",
        ],
        images: &[
            "https://images.unsplash.com/photo-1565514020176-db79339a6a5d?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1618221195710-dd6b41faaea6?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1600607686527-6fb886090705?q=80&w=1000&auto=format&fit=crop",
            "https://images.unsplash.com/photo-1512917774080-9991f1c4c750?q=80&w=1000&auto=format&fit=crop",
        ],
    },
];

static DEFAULT_BUCKET: Bucket = Bucket {
    name: "DEFAULT",
    keywords: &[],
    images: &[
        "https://images.unsplash.com/photo-1622627958569-8d7d91e84605?q=80&w=1000&auto=format&fit=crop",
        "https://images.unsplash.com/photo-1579546929518-9e396f3cc809?q=80&w=1000&auto=format&fit=crop",
        "https://images.unsplash.com/photo-1550684848-fac1c5b4e853?q=80&w=1000&auto=format&fit=crop",
    ],
};

/// Picks a curated image for the prompt. Total: always returns a URL.
///
/// `fresh == false` hashes the prompt so re-renders stay stable;
/// `fresh == true` picks at random and appends a cache buster so a
/// user-triggered regenerate looks different even on this path.
pub fn select(prompt: &str, fresh: bool) -> String {
    let images = bucket_for(prompt).images;
    if fresh {
        let url = images[rand::rng().random_range(0..images.len())];
        format!("{url}&v={}", Utc::now().timestamp_millis())
    } else {
        images[stable_index(prompt, images.len())].to_string()
    }
}

pub fn bucket_name(prompt: &str) -> &'static str {
    bucket_for(prompt).name
}

pub fn bucket_images(prompt: &str) -> &'static [&'static str] {
    bucket_for(prompt).images
}

fn bucket_for(prompt: &str) -> &'static Bucket {
    let lowered = prompt.to_lowercase();
    BUCKETS
        .iter()
        .find(|bucket| bucket.keywords.iter().any(|keyword| lowered.contains(keyword)))
        .unwrap_or(&DEFAULT_BUCKET)
}

// Rolling hash over UTF-16 code units (h = c + (h << 5) - h), wrapping at
// i32, so the same prompt always lands on the same image.
fn stable_index(prompt: &str, len: usize) -> usize {
    let mut hash: i32 = 0;
    for unit in prompt.encode_utf16() {
        hash = (unit as i32).wrapping_add((hash << 5).wrapping_sub(hash));
    }
    hash.unsigned_abs() as usize % len
}

#[cfg(test)]
mod tests {
    use super::{bucket_images, bucket_name, select};

    #[test]
    fn stable_selection_is_deterministic() {
        for prompt in ["Ferrari rojo", "viaje a Japón", "algo sin categoría", ""] {
            assert_eq!(select(prompt, false), select(prompt, false));
        }
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(bucket_name("FERRARI ROJO"), "VEHICLES");
        assert_eq!(bucket_name("MANSIÓN MODERNA"), "HOME");
    }

    #[test]
    fn vehicle_keywords_outrank_travel_keywords() {
        // "viaje" (TRAVEL) and "ferrari" (VEHICLES) both match; VEHICLES is
        // checked first.
        assert_eq!(bucket_name("viaje en ferrari"), "VEHICLES");
    }

    #[test]
    fn unmatched_prompts_use_the_default_bucket() {
        assert_eq!(bucket_name("libertad financiera"), "DEFAULT");
        assert!(bucket_images("libertad financiera")
            .contains(&select("libertad financiera", false).as_str()));
    }

    #[test]
    fn fresh_selection_draws_from_the_matched_bucket_with_cache_buster() {
        let reference = select("Ferrari rojo", true);
        let (base, marker) = reference.split_once("&v=").expect("cache buster present");
        assert!(bucket_images("Ferrari rojo").contains(&base));
        assert!(marker.chars().all(|ch| ch.is_ascii_digit()));
    }

    #[test]
    fn stable_selection_comes_from_the_matched_bucket() {
        let reference = select("quiero un yate", false);
        assert!(bucket_images("quiero un yate").contains(&reference.as_str()));
    }
}
