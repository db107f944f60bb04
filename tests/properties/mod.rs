mod mutations_pass_through;
mod round_trip;
