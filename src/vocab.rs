//! Vocabulary registry: themed word pools, curated pair tables, and the stem
//! sets the procedural factories combine. Everything here is built once and
//! shared read-only between requests.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

use crate::token::{parse_all, WordToken};

/// A fixed, de-duplicated list of tokens with O(1) membership.
#[derive(Debug, Clone)]
pub struct Pool {
    key: String,
    label: String,
    domain: String,
    words: Vec<WordToken>,
    index: HashSet<WordToken>,
}

impl Pool {
    pub fn new(key: &str, label: &str, domain: &str, raw: &[&str]) -> Self {
        Self::from_tokens(key, label, domain, parse_all(raw.iter().copied()))
    }

    pub fn from_tokens(key: &str, label: &str, domain: &str, tokens: Vec<WordToken>) -> Self {
        let mut index = HashSet::with_capacity(tokens.len());
        let words: Vec<WordToken> = tokens.into_iter().filter(|t| index.insert(t.clone())).collect();
        Pool {
            key: key.to_string(),
            label: label.to_string(),
            domain: domain.to_string(),
            words,
            index,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn words(&self) -> &[WordToken] {
        &self.words
    }

    pub fn contains(&self, word: &WordToken) -> bool {
        self.index.contains(word)
    }

    /// Up to `n` distinct tokens not in `excluding`, in random order. Short
    /// results are normal when the pool is small or heavily excluded.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        n: usize,
        excluding: &HashSet<WordToken>,
        rng: &mut R,
    ) -> Vec<WordToken> {
        let open: Vec<&WordToken> = self.words.iter().filter(|w| !excluding.contains(*w)).collect();
        let mut picked: Vec<WordToken> = open.choose_multiple(rng, n).map(|w| (*w).clone()).collect();
        picked.shuffle(rng);
        picked
    }
}

/// How the two members of a pair relate. Anagram pairs are additionally
/// checked letter-by-letter when a group is proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRelation {
    Homophone,
    Anagram,
}

/// Curated table of true pairs. A pairing only means something when both
/// members appear together.
#[derive(Debug, Clone)]
pub struct PairTable {
    label: String,
    relation: PairRelation,
    pairs: Vec<(WordToken, WordToken)>,
}

impl PairTable {
    pub fn new(label: &str, relation: PairRelation, raw: &[(&str, &str)]) -> Self {
        let mut seen = HashSet::new();
        let mut pairs = Vec::with_capacity(raw.len());
        for (a, b) in raw {
            let (Ok(a), Ok(b)) = (WordToken::parse(a), WordToken::parse(b)) else { continue };
            if a == b || seen.contains(&a) || seen.contains(&b) {
                continue;
            }
            seen.insert(a.clone());
            seen.insert(b.clone());
            pairs.push((a, b));
        }
        PairTable {
            label: label.to_string(),
            relation,
            pairs,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn relation(&self) -> PairRelation {
        self.relation
    }

    pub fn size(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> &[(WordToken, WordToken)] {
        &self.pairs
    }

    pub fn contains(&self, word: &WordToken) -> bool {
        self.pairs.iter().any(|(a, b)| a == word || b == word)
    }

    /// Up to `n` whole pairs, none touching `excluding`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        n: usize,
        excluding: &HashSet<WordToken>,
        rng: &mut R,
    ) -> Vec<(WordToken, WordToken)> {
        let open: Vec<&(WordToken, WordToken)> = self
            .pairs
            .iter()
            .filter(|(a, b)| !excluding.contains(a) && !excluding.contains(b))
            .collect();
        open.choose_multiple(rng, n).map(|p| (*p).clone()).collect()
    }
}

/// A real word and real words exactly one substituted letter away from it.
#[derive(Debug, Clone)]
pub struct LetterLadder {
    pub base: WordToken,
    pub neighbors: Vec<WordToken>,
}

/// A hand-checked quartet source whose category has no mechanical proof.
#[derive(Debug, Clone)]
pub struct CuratedSet {
    pub label: String,
    pub words: Vec<WordToken>,
}

/// The whole registry. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub themes: Vec<Arc<Pool>>,
    pub pair_tables: Vec<Arc<PairTable>>,
    pub body_parts: Arc<Pool>,
    pub prefixes: Vec<WordToken>,
    pub prefix_stems: Vec<WordToken>,
    pub suffixes: Vec<WordToken>,
    pub suffix_stems: Vec<WordToken>,
    pub mash_tails: Vec<WordToken>,
    pub needles: Vec<String>,
    pub ladders: Vec<LetterLadder>,
    pub curated: Vec<CuratedSet>,
    /// Union of every themed, paired, and ladder word; the search space for
    /// hidden-substring groups.
    pub lexicon: Vec<WordToken>,
}

impl Vocabulary {
    pub fn standard() -> Self {
        let themes: Vec<Arc<Pool>> = THEMES
            .iter()
            .map(|(key, label, domain, words)| Arc::new(Pool::new(key, label, domain, words)))
            .collect();
        let pair_tables = vec![
            Arc::new(PairTable::new("HOMOPHONE PAIRS", PairRelation::Homophone, HOMOPHONES)),
            Arc::new(PairTable::new("ANAGRAM PAIRS", PairRelation::Anagram, ANAGRAMS)),
        ];
        let ladders: Vec<LetterLadder> = LADDERS
            .iter()
            .filter_map(|(base, neighbors)| {
                Some(LetterLadder {
                    base: WordToken::parse(base).ok()?,
                    neighbors: parse_all(neighbors.iter().copied()),
                })
            })
            .collect();
        let curated = CURATED
            .iter()
            .map(|(label, words)| CuratedSet {
                label: label.to_string(),
                words: parse_all(words.iter().copied()),
            })
            .collect();

        let mut lexicon: Vec<WordToken> = themes.iter().flat_map(|p| p.words().iter().cloned()).collect();
        for table in &pair_tables {
            for (a, b) in table.pairs() {
                lexicon.push(a.clone());
                lexicon.push(b.clone());
            }
        }
        for ladder in &ladders {
            lexicon.push(ladder.base.clone());
            lexicon.extend(ladder.neighbors.iter().cloned());
        }
        let mut seen = HashSet::new();
        lexicon.retain(|w| seen.insert(w.clone()));

        Vocabulary {
            themes,
            pair_tables,
            body_parts: Arc::new(Pool::new("body", "BODY PARTS", "body", BODY_PARTS)),
            prefixes: parse_all(PREFIXES.iter().copied()),
            prefix_stems: parse_all(PREFIX_STEMS.iter().copied()),
            suffixes: parse_all(SUFFIXES.iter().copied()),
            suffix_stems: parse_all(SUFFIX_STEMS.iter().copied()),
            mash_tails: parse_all(MASH_TAILS.iter().copied()),
            needles: NEEDLES.iter().map(|s| s.to_string()).collect(),
            ladders,
            curated,
            lexicon,
        }
    }

    pub fn theme(&self, key: &str) -> Option<&Arc<Pool>> {
        self.themes.iter().find(|p| p.key() == key)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

type Theme = (&'static str, &'static str, &'static str, &'static [&'static str]);

const THEMES: &[Theme] = &[
    ("slang", "INTERNET SLANG", "slang", &[
        "RIZZ", "YEET", "NO CAP", "BASED", "MID", "DRIP", "SUS", "COPE", "LURK", "RATIO",
        "GLOWUP", "SALTY", "CRINGE", "SIMP", "GOAT", "STAN", "DEADASS", "BET", "FLEX", "VIBE",
        "GHOST", "SHOOK", "SLAY", "BUSSIN", "LOWKEY", "HIGHKEY", "YAP", "AURA", "DELULU",
    ]),
    ("gaming", "GAMING TERMS", "gaming", &[
        "NPC", "BUFF", "NERF", "AGGRO", "DPS", "HEAL", "TANK", "LOOT", "GRIND", "RAID",
        "PATCH", "GLITCH", "META", "SWEAT", "SMURF", "RESPAWN", "SPEEDRUN", "K/D", "LAG",
        "CAMPER", "NOOB", "COMBO", "BOSS", "LOBBY",
    ]),
    ("minecraft", "MINECRAFT THINGS", "minecraft", &[
        "NETHER", "END", "ELYTRA", "BEACON", "ANVIL", "OBSIDIAN", "REDSTONE", "SPAWNER",
        "VILLAGER", "ENCHANT", "POTION", "CREEPER", "DIAMOND", "EMERALD", "ENDER PEARL",
        "ENDERMAN", "BEDROCK", "TORCH", "PICKAXE", "WITHER",
    ]),
    ("fantasy", "FANTASY WEAPONS & MONSTERS", "fantasy", &[
        "LONGSWORD", "MACE", "FLAIL", "SCIMITAR", "HALBERD", "RAPIER", "SPEAR", "DAGGER",
        "BASILISK", "WYVERN", "DRAGON", "GRIMOIRE", "ELDRITCH", "PHYLACTERY", "GRIFFIN",
        "HYDRA", "LICH", "TROLL", "WARHAMMER", "CLAYMORE",
    ]),
    ("science", "SCIENCE/MATH TERMS", "science", &[
        "COSINE", "TANGENT", "VECTOR", "MOMENTUM", "ENTROPY", "ISOTOPE", "IONIC", "COVALENT",
        "QUARK", "NEUTRINO", "SPECTRUM", "FRACTAL", "PRIME", "INERTIA", "FREQUENCY", "PHOTON",
        "ENZYME", "MATRIX", "INTEGRAL", "PROTON", "CATALYST",
    ]),
    ("big_words", "BIG VOCABULARY WORDS", "words", &[
        "PERNICIOUS", "OBDURATE", "PERSPICACIOUS", "LOQUACIOUS", "FASTIDIOUS", "OBFUSCATE",
        "MENDACIOUS", "DELETERIOUS", "UBIQUITOUS", "SYCOPHANT", "INEFFABLE", "EPHEMERAL",
        "QUIXOTIC", "SANGUINE", "LACONIC", "PERFIDIOUS",
    ]),
    ("fandom", "SCI-FI & FANTASY ARCHETYPES", "fandom", &[
        "AVENGER", "JEDI", "SITH", "HOBBIT", "WIZARD", "CYBORG", "MUTANT", "SPARTAN", "KAIJU",
        "VAMPIRE", "WEREWOLF", "ANDROID", "ALIEN", "PIRATE", "NINJA", "ZOMBIE", "TITAN",
        "SAMURAI",
    ]),
    ("mythology", "GREEK & ROMAN GODS", "mythology", &[
        "ZEUS", "HERA", "ATHENA", "APOLLO", "ARES", "HERMES", "HADES", "POSEIDON", "ARTEMIS",
        "DEMETER", "MARS", "VENUS", "MERCURY", "JUPITER", "NEPTUNE", "SATURN", "JUNO",
        "MINERVA", "PLUTO",
    ]),
    ("planets", "PLANETS", "space", &[
        "MERCURY", "VENUS", "EARTH", "MARS", "JUPITER", "SATURN", "URANUS", "NEPTUNE",
    ]),
    ("colors", "COLORS", "colors", &[
        "SCARLET", "CRIMSON", "TEAL", "AZURE", "INDIGO", "VIOLET", "MAGENTA", "CYAN", "OCHRE",
        "MAUVE", "LAVENDER", "MAROON", "TURQUOISE", "AMBER", "EMERALD", "IVORY",
    ]),
    ("verb_noun", "WORDS THAT WORK AS BOTH VERBS AND NOUNS", "linguistics", &[
        "PATCH", "RING", "PLANE", "BAIT", "LURK", "SPAWN", "GRIND", "DRIP", "STACK", "SHIFT",
        "FLEX", "RAID", "LOOT", "GHOST", "TANK", "CRAFT",
    ]),
    ("music", "MUSIC GENRES", "music", &[
        "JAZZ", "BLUES", "FUNK", "DISCO", "TECHNO", "GRUNGE", "REGGAE", "SOUL", "PUNK", "OPERA",
        "GOSPEL", "SKA", "HOUSE", "SWING", "BEBOP", "METAL", "EMO",
    ]),
    ("body", "BODY PARTS", "body", BODY_PARTS),
];

const BODY_PARTS: &[&str] = &[
    "TOE", "HEEL", "ARCH", "SOLE", "ANKLE", "CALF", "KNEE", "WRIST", "PALM", "ELBOW", "SHIN",
    "HIP", "CHIN", "NECK", "THUMB",
];

const HOMOPHONES: &[(&str, &str)] = &[
    ("WEEK", "WEAK"), ("PAIR", "PEAR"), ("KNIGHT", "NIGHT"), ("SEA", "SEE"),
    ("WAIST", "WASTE"), ("SENT", "SCENT"), ("BARE", "BEAR"), ("PALE", "PAIL"),
    ("MAIL", "MALE"), ("FLOUR", "FLOWER"), ("HOUR", "OUR"), ("RIGHT", "WRITE"),
    ("SON", "SUN"), ("TAIL", "TALE"), ("BLUE", "BLEW"), ("HEAL", "HEEL"),
];

const ANAGRAMS: &[(&str, &str)] = &[
    ("LISTEN", "SILENT"), ("EARTH", "HEART"), ("NIGHT", "THING"), ("DUSTY", "STUDY"),
    ("ELBOW", "BELOW"), ("ANGEL", "GLEAN"), ("STATE", "TASTE"), ("INCH", "CHIN"),
    ("LEMON", "MELON"), ("SWORD", "WORDS"),
];

const LADDERS: &[(&str, &[&str])] = &[
    ("BOOK", &["LOOK", "COOK", "HOOK", "NOOK", "ROOK", "TOOK", "BOOT", "BOOM", "BOON"]),
    ("CAT", &["BAT", "HAT", "MAT", "RAT", "SAT", "VAT", "CAR", "CAB", "CAN", "CAP", "COT", "CUT"]),
    ("HAND", &["BAND", "LAND", "SAND", "WAND", "HARD", "HIND", "HANG"]),
    ("MINE", &["DINE", "FINE", "LINE", "NINE", "PINE", "VINE", "WINE", "MILE", "MIME", "MIND"]),
    ("GAME", &["CAME", "FAME", "LAME", "NAME", "SAME", "TAME", "GATE", "GAVE", "GALE"]),
    ("LIGHT", &["FIGHT", "MIGHT", "NIGHT", "RIGHT", "SIGHT", "TIGHT", "EIGHT"]),
    ("RING", &["KING", "SING", "WING", "DING", "PING", "RANG", "RUNG", "RINK"]),
];

const PREFIXES: &[&str] = &[
    "MEGA", "NANO", "HYPER", "ULTRA", "DARK", "NEO", "RETRO", "AERO", "PYRO", "CRYO", "LUNA",
    "SOLAR", "VOID", "PIXEL", "DREAM", "EMBER", "MOON", "STAR", "NOVA", "ARC",
];

const PREFIX_STEMS: &[&str] = &[
    "TON", "STAR", "ARC", "ROOM", "LINE", "PATH", "BYTE", "CORE", "SCOPE", "SHIFT", "STACK",
    "RIFT", "FORM",
];

const SUFFIXES: &[&str] = &[
    "CRAFT", "VERSE", "PUNK", "CORE", "GATE", "WAVE", "NADO", "TIER", "LOCK", "SPLAIN", "DROP",
];

const SUFFIX_STEMS: &[&str] = &[
    "STAR", "MOON", "DREAM", "EMBER", "PIXEL", "RETRO", "NEO", "VOID", "AERO", "HYPER", "NANO",
    "ULTRA",
];

const MASH_TAILS: &[&str] = &[
    "BLADE", "CAST", "SHIFT", "RIFT", "BORN", "BOUND", "FALL", "FORGE", "KIND", "SPAWN",
    "GLYPH", "WALK",
];

const NEEDLES: &[&str] = &["ART", "EAR", "RAT", "ACE", "ONE", "ANT", "ENT", "HER", "RAN", "ION"];

const CURATED: &[(&str, &[&str])] = &[
    ("THINGS WITH SCALES", &["FISH", "PIANO", "MAP", "DRAGON", "SNAKE", "THERMOMETER"]),
    ("THINGS WITH TEETH", &["COMB", "SAW", "ZIPPER", "GEAR", "SHARK", "RAKE"]),
    ("THINGS THAT HAVE RINGS", &["TREE", "SATURN", "CIRCUS", "BOXING", "PHONE", "BELL"]),
    ("THINGS WITH SHELLS", &["TURTLE", "EGG", "TACO", "NUT", "SNAIL", "OYSTER"]),
    ("THINGS WITH NEEDLES", &["PINE", "CACTUS", "COMPASS", "SYRINGE", "HEDGEHOG", "RECORD"]),
];
