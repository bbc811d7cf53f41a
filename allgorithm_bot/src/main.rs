use club_bot_commons::start_everything;

fn main() {
    start_everything("WARN,allgorithm_bot=debug", allgorithm_bot::entry());
}
