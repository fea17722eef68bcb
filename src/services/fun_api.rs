//! Public APIs behind the `/fun` commands. Every call returns a `Result`; the commands
//! decide which German fallback text to show when one fails.

use crate::{
    errors::{Error, Result},
    services::check_status,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

/// Data shown by `/fun pokemon`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pokemon {
    /// Capitalised name
    pub name: String,
    /// National dex number
    pub id: u32,
    /// Capitalised type names
    pub types: Vec<String>,
    /// Capitalised ability names
    pub abilities: Vec<String>,
    /// Front sprite URL
    pub sprite: Option<String>,
}

/// Result of a name-based gender guess
#[derive(Debug, Clone, PartialEq)]
pub struct GenderGuess {
    /// `male`, `female`, or `None` when the name is unknown
    pub gender: Option<String>,
    /// Probability in percent
    pub probability: f64,
}

#[derive(Debug, Deserialize)]
struct PokemonResponse {
    name: String,
    id: u32,
    #[serde(default)]
    types: Vec<PokemonType>,
    #[serde(default)]
    abilities: Vec<PokemonAbility>,
    #[serde(default)]
    sprites: Sprites,
}

#[derive(Debug, Deserialize)]
struct PokemonType {
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Debug, Deserialize)]
struct PokemonAbility {
    ability: NamedResource,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Sprites {
    front_default: Option<String>,
}

impl From<PokemonResponse> for Pokemon {
    fn from(value: PokemonResponse) -> Self {
        Self {
            name: title_case(&value.name),
            id: value.id,
            types: value.types.into_iter().map(|t| title_case(&t.kind.name)).collect(),
            abilities: value
                .abilities
                .into_iter()
                .map(|a| title_case(&a.ability.name))
                .collect(),
            sprite: value.sprites.front_default,
        }
    }
}

/// Client for the fun APIs.
#[derive(Debug, Clone)]
pub struct FunApi {
    http: reqwest::Client,
}

impl FunApi {
    /// Creates the client on top of a shared HTTP client.
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn get_json(&self, service: &'static str, url: &str) -> Result<Value> {
        let response = self.http.get(url).send().await?;
        // Some of these APIs answer with text/html content types, so parse by hand.
        let text = check_status(service, response)?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// A random useless fact in German.
    #[instrument(skip(self))]
    pub async fn useless_fact(&self) -> Result<String> {
        let body = self
            .get_json("uselessfacts", "https://uselessfacts.jsph.pl/random.json?language=de")
            .await?;
        string_at(&body, &["text"], "uselessfacts")
    }

    /// A random excuse.
    #[instrument(skip(self))]
    pub async fn excuse(&self) -> Result<String> {
        let body = self
            .get_json("excuser", "https://excuser.herokuapp.com/v1/excuse")
            .await?;
        let first = body.get(0).cloned().unwrap_or(Value::Null);
        string_at(&first, &["excuse"], "excuser")
    }

    /// A random Chuck Norris joke.
    #[instrument(skip(self))]
    pub async fn chuck_norris(&self) -> Result<String> {
        let body = self
            .get_json("chucknorris", "https://api.chucknorris.io/jokes/random")
            .await?;
        string_at(&body, &["value"], "chucknorris")
    }

    /// URL of a random dog picture.
    #[instrument(skip(self))]
    pub async fn dog_image(&self) -> Result<String> {
        let body = self
            .get_json("dog.ceo", "https://dog.ceo/api/breeds/image/random")
            .await?;
        string_at(&body, &["message"], "dog.ceo")
    }

    /// A random piece of advice.
    #[instrument(skip(self))]
    pub async fn advice(&self) -> Result<String> {
        let body = self
            .get_json("adviceslip", "https://api.adviceslip.com/advice")
            .await?;
        string_at(&body, &["slip", "advice"], "adviceslip")
    }

    /// Looks up a Pokémon by name or number.
    #[instrument(skip(self))]
    pub async fn pokemon(&self, name: &str) -> Result<Pokemon> {
        let name = name.trim().to_lowercase();
        let mut url = reqwest::Url::parse("https://pokeapi.co/api/v2/pokemon").map_err(|e| {
            Error::ExternalService {
                service: "pokeapi",
                message: e.to_string(),
            }
        })?;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&name);
        }

        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                what: format!("Pokémon '{name}'"),
            });
        }
        let body: PokemonResponse = check_status("pokeapi", response)?.json().await?;
        Ok(body.into())
    }

    /// Estimated age for a first name.
    #[instrument(skip(self))]
    pub async fn age(&self, name: &str) -> Result<Option<u32>> {
        let response = self
            .http
            .get("https://api.agify.io")
            .query(&[("name", name)])
            .send()
            .await?;
        let body: Value = check_status("agify", response)?.json().await?;
        Ok(body
            .get("age")
            .and_then(Value::as_u64)
            .and_then(|age| u32::try_from(age).ok()))
    }

    /// Estimated gender for a first name.
    #[instrument(skip(self))]
    pub async fn gender(&self, name: &str) -> Result<GenderGuess> {
        let response = self
            .http
            .get("https://api.genderize.io")
            .query(&[("name", name)])
            .send()
            .await?;
        let body: Value = check_status("genderize", response)?.json().await?;
        Ok(parse_gender(&body))
    }
}

fn string_at(body: &Value, path: &[&str], service: &'static str) -> Result<String> {
    path.iter()
        .try_fold(body, |node, key| node.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::ExternalService {
            service,
            message: format!("missing field {}", path.join(".")),
        })
}

fn parse_gender(body: &Value) -> GenderGuess {
    GenderGuess {
        gender: body.get("gender").and_then(Value::as_str).map(str::to_string),
        probability: body.get("probability").and_then(Value::as_f64).unwrap_or(0.0) * 100.0,
    }
}

/// `mr-mime` -> `Mr-Mime`
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut start = true;
    for c in name.chars() {
        if start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        start = !c.is_alphanumeric();
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_at() {
        let body = json!({"slip": {"id": 1, "advice": "Trink Wasser."}});
        assert_eq!(string_at(&body, &["slip", "advice"], "x").unwrap(), "Trink Wasser.");
        assert!(matches!(
            string_at(&body, &["slip", "missing"], "x"),
            Err(Error::ExternalService { service: "x", .. })
        ));
    }

    #[test]
    fn test_pokemon_conversion() {
        let raw: PokemonResponse = serde_json::from_value(json!({
            "name": "mr-mime",
            "id": 122,
            "types": [{"slot": 1, "type": {"name": "psychic", "url": ""}}, {"slot": 2, "type": {"name": "fairy", "url": ""}}],
            "abilities": [{"ability": {"name": "soundproof", "url": ""}}],
            "sprites": {"front_default": "https://img/122.png"}
        }))
        .unwrap();
        let pokemon = Pokemon::from(raw);
        assert_eq!(pokemon.name, "Mr-Mime");
        assert_eq!(pokemon.types, vec!["Psychic", "Fairy"]);
        assert_eq!(pokemon.abilities, vec!["Soundproof"]);
        assert_eq!(pokemon.sprite.as_deref(), Some("https://img/122.png"));
    }

    #[test]
    fn test_parse_gender() {
        let guess = parse_gender(&json!({"name": "anna", "gender": "female", "probability": 0.98}));
        assert_eq!(guess.gender.as_deref(), Some("female"));
        assert!((guess.probability - 98.0).abs() < 1e-9);

        let unknown = parse_gender(&json!({"name": "xqz", "gender": null, "probability": 0.0}));
        assert_eq!(unknown.gender, None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("pikachu"), "Pikachu");
        assert_eq!(title_case("solar-power"), "Solar-Power");
    }
}
