//! Built-in card templates served by the offline catalog supply.

/// (name, type, hp)
pub const TEMPLATES: &[(&str, &str, i64)] = &[
    ("Bulbasaur", "Grass", 40),
    ("Ivysaur", "Grass", 60),
    ("Venusaur", "Grass", 100),
    ("Charmander", "Fire", 50),
    ("Charmeleon", "Fire", 80),
    ("Charizard", "Fire", 120),
    ("Squirtle", "Water", 40),
    ("Wartortle", "Water", 70),
    ("Blastoise", "Water", 100),
    ("Pikachu", "Lightning", 60),
    ("Raichu", "Lightning", 80),
    ("Jigglypuff", "Colorless", 60),
    ("Meowth", "Colorless", 50),
    ("Psyduck", "Water", 50),
    ("Machop", "Fighting", 50),
    ("Machamp", "Fighting", 100),
    ("Geodude", "Fighting", 50),
    ("Gastly", "Psychic", 30),
    ("Haunter", "Psychic", 60),
    ("Gengar", "Psychic", 80),
    ("Onix", "Fighting", 90),
    ("Magnemite", "Lightning", 40),
    ("Eevee", "Colorless", 50),
    ("Snorlax", "Colorless", 90),
    ("Dratini", "Colorless", 40),
    ("Dragonite", "Colorless", 100),
    ("Mewtwo", "Psychic", 70),
    ("Mew", "Psychic", 50),
    ("Vulpix", "Fire", 50),
    ("Ninetales", "Fire", 80),
    ("Lapras", "Water", 80),
    ("Scyther", "Grass", 70),
];
