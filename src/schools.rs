/// Selector value meaning "my city is not listed".
pub const OTHER_CITY: &str = "Outra Cidade";
/// Selector value meaning "my school is not listed".
pub const OTHER_SCHOOL: &str = "Outra Escola";

const SCHOOLS_BY_CITY: &[(&str, &[&str])] = &[
    (
        "Canoinhas",
        &[
            "Cedup Vidal Ramos",
            "Ceja de Canoinhas",
            "EEB Almirante Barroso",
            "EEB Irma Maria Felicitas",
            "EEB João José de S Cabral",
            "EEB Julia Baleoli Zaniolo",
            "EEB Professor Manoel da S Quadros",
            "EEB Rodolfo Zipperer",
            "EEB Santa Cruz",
            "Eef Sagrado Coracao de Jesus",
        ],
    ),
    (
        "Três Barras",
        &[
            "EEB Colombo Machado Salles",
            "EEB Frei Menandro Kamps",
            "EEB General Osorio",
        ],
    ),
    ("Bela Vista do Toldo", &["EEB Estanislau Schumann"]),
    ("Major Vieira", &["EEB Luiz Davet"]),
    ("Irineópolis", &["EEB Horacio Nunes"]),
    (
        "Porto União",
        &[
            "EEB Antonio Gonzaga",
            "EEB Balduíno Cardoso",
            "EEB Cel Cid Gonzaga",
            "EEB Nilo Pecanha",
            "EEB Professor Clementino Britto",
            "EEB Professor Germano Wagenfuhr",
        ],
    ),
];

pub fn cities() -> impl Iterator<Item = &'static str> {
    SCHOOLS_BY_CITY.iter().map(|(city, _)| *city)
}

/// Options for the school selector once a city is picked.
///
/// Known cities list their schools followed by the "other" option; the
/// "other city" choice offers only that option; an unknown city offers none.
pub fn school_options(city: &str) -> Vec<&'static str> {
    if city == OTHER_CITY {
        return vec![OTHER_SCHOOL];
    }

    SCHOOLS_BY_CITY
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, schools)| {
            let mut options = schools.to_vec();
            options.push(OTHER_SCHOOL);
            options
        })
        .unwrap_or_default()
}
