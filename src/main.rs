use pokemon_tcg_battle::rocket_initialize;

#[rocket::launch]
fn rocket() -> _ {
    rocket_initialize()
}
