mod dates;
mod parse_good;
mod props;
